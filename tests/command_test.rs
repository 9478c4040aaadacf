mod common;

use bsb_proto::{BusVariant, CommandId, Error, Frame, Request, Telegram, Timing};
use common::{sealed, SerialIOPlane};

const REPLY_AT_US: u64 = 200_000;

fn bsb_reply(dest: u8, command: [u8; 4]) -> Vec<u8> {
    let mut body = vec![0xDC, 0x80, dest, 0x0E, 0x07];
    body.extend_from_slice(&command);
    body.extend_from_slice(&[0x00, 0x01, 0x02]);
    sealed(BusVariant::Bsb, &body)
}

fn lpb_reply(command: [u8; 4]) -> Vec<u8> {
    let mut body = vec![0x78, 0x0F, 0x06, 0x00, 0xC0, 0x02, 0x00, 0x14, 0x07];
    body.extend_from_slice(&command);
    body.push(0x2A);
    sealed(BusVariant::Lpb, &body)
}

#[test]
fn test_query_bsb() {
    let io = SerialIOPlane::new();
    let mut bus = io.bus(BusVariant::Bsb, 0x42, 0x00);
    let reply = bsb_reply(0x42, [0x3D, 0x2D, 0x02, 0x15]);
    io.queue_frame(BusVariant::Bsb, &reply, REPLY_AT_US);

    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    assert_eq!(
        bus.send(&Request::query(0x06, 0x3D2D_0215u32), &mut tx, &mut rx),
        Ok(())
    );
    assert_eq!(&tx[4..9], &[0x06, 0x2D, 0x3D, 0x02, 0x15]);
    assert_eq!(rx.as_slice(), &reply[..]);
    assert!((200..210).contains(&io.now_ms()));
}

#[test]
fn test_query_hears_own_echo() {
    let io = SerialIOPlane::new();
    io.set_echo(true);
    let mut bus = io.bus(BusVariant::Bsb, 0x42, 0x00);
    let reply = bsb_reply(0x42, [0x3D, 0x2D, 0x02, 0x15]);
    io.queue_frame(BusVariant::Bsb, &reply, REPLY_AT_US);

    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    assert_eq!(
        bus.send(&Request::query(0x06, 0x3D2D_0215u32), &mut tx, &mut rx),
        Ok(())
    );
    assert_eq!(rx.as_slice(), &reply[..]);
}

#[test]
fn test_reply_for_other_station() {
    let io = SerialIOPlane::new();
    let mut bus = io.bus(BusVariant::Bsb, 0x42, 0x00);
    io.queue_frame(
        BusVariant::Bsb,
        &bsb_reply(0x43, [0x3D, 0x2D, 0x02, 0x15]),
        REPLY_AT_US,
    );

    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    assert_eq!(
        bus.send(&Request::query(0x06, 0x3D2D_0215u32), &mut tx, &mut rx),
        Err(Error::ReplyTimeout)
    );
    assert!(io.now_ms() >= 3000);
}

#[test]
fn test_query_lpb() {
    let io = SerialIOPlane::new();
    let mut bus = io.bus(BusVariant::Lpb, 0x06, 0x00);
    let reply = lpb_reply([0x00, 0xD5, 0x00, 0x00]);
    io.queue_frame(BusVariant::Lpb, &reply, REPLY_AT_US);

    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    assert_eq!(
        bus.send(&Request::query(0x06, 0x00D5_0000u32), &mut tx, &mut rx),
        Ok(())
    );
    assert_eq!(&tx[..4], &[0x78, 0x0E, 0x00, 0x06]);
    assert_eq!(rx.as_slice(), &reply[..]);
}

#[test]
fn test_lpb_reply_command_mismatch() {
    let io = SerialIOPlane::new();
    let mut bus = io.bus(BusVariant::Lpb, 0x06, 0x00);
    // addressed to us, but for another command-id
    io.queue_frame(
        BusVariant::Lpb,
        &lpb_reply([0x00, 0xD5, 0x00, 0x01]),
        REPLY_AT_US,
    );

    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    let started = io.now_ms();
    assert_eq!(
        bus.send(&Request::query(0x06, 0x00D5_0000u32), &mut tx, &mut rx),
        Err(Error::ReplyTimeout)
    );
    assert!(io.now_ms() - started >= 3000);
}

#[test]
fn test_reply_budget() {
    let io = SerialIOPlane::new();
    let mut bus = io.bus(BusVariant::Bsb, 0x42, 0x00);
    for _ in 0..15 {
        io.queue_frame(
            BusVariant::Bsb,
            &bsb_reply(0x43, [0x3D, 0x2D, 0x02, 0x15]),
            REPLY_AT_US,
        );
    }
    let reply = bsb_reply(0x42, [0x3D, 0x2D, 0x02, 0x15]);
    io.queue_frame(BusVariant::Bsb, &reply, REPLY_AT_US);

    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    assert_eq!(
        bus.send(&Request::query(0x06, 0x3D2D_0215u32), &mut tx, &mut rx),
        Err(Error::ReplyTimeout)
    );
    // gave up before the deadline, the matching reply is still queued
    assert!(io.now_ms() < 3000);
    assert_eq!(io.pending(), reply.len());

    // with a larger budget the reply is found
    let io2 = SerialIOPlane::new();
    let mut bus = io2.bus_with_timing(
        BusVariant::Bsb,
        0x42,
        0x00,
        Timing {
            reply_attempts: 16,
            ..Timing::default()
        },
    );
    for _ in 0..15 {
        io2.queue_frame(
            BusVariant::Bsb,
            &bsb_reply(0x43, [0x3D, 0x2D, 0x02, 0x15]),
            REPLY_AT_US,
        );
    }
    io2.queue_frame(BusVariant::Bsb, &reply, REPLY_AT_US);
    assert_eq!(
        bus.send(&Request::query(0x06, 0x3D2D_0215u32), &mut tx, &mut rx),
        Ok(())
    );
    assert_eq!(rx.as_slice(), &reply[..]);
}

#[test]
fn test_lpb_truncated_error_reply() {
    let error = sealed(
        BusVariant::Lpb,
        &[0x78, 0x0A, 0x06, 0x00, 0xC0, 0x02, 0x00, 0x14, 0x08],
    );
    assert_eq!(error.len(), 11);

    let io = SerialIOPlane::new();
    let mut bus = io.bus(BusVariant::Lpb, 0x06, 0x00);
    bus.config_mut().truncated_error_replies = true;
    io.queue_frame(BusVariant::Lpb, &error, REPLY_AT_US);

    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    assert_eq!(
        bus.send(&Request::query(0x06, 0x00D5_0000u32), &mut tx, &mut rx),
        Err(Error::ErrorReply)
    );
    assert_eq!(rx.as_slice(), &error[..]);
    assert!((200..210).contains(&io.now_ms()));

    // without the option it is just another non-matching frame
    let io = SerialIOPlane::new();
    let mut bus = io.bus(BusVariant::Lpb, 0x06, 0x00);
    io.queue_frame(BusVariant::Lpb, &error, REPLY_AT_US);
    assert_eq!(
        bus.send(&Request::query(0x06, 0x00D5_0000u32), &mut tx, &mut rx),
        Err(Error::ReplyTimeout)
    );
}

#[test]
fn test_no_reply_requested() {
    let io = SerialIOPlane::new();
    let mut bus = io.bus(BusVariant::Bsb, 0x42, 0x00);
    io.queue_frame(
        BusVariant::Bsb,
        &bsb_reply(0x42, [0x3D, 0x2D, 0x02, 0x15]),
        REPLY_AT_US,
    );

    let request = Request {
        expect_reply: false,
        ..Request::query(0x02, 0x3D2D_0215u32)
    };
    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    assert_eq!(bus.send(&request, &mut tx, &mut rx), Ok(()));
    assert!(rx.is_empty());
    assert!(io.now_ms() < 200);
}

#[test]
fn test_round_trip() {
    for &variant in [BusVariant::Bsb, BusVariant::Lpb].iter() {
        let line = SerialIOPlane::new();
        let mut sender = line.bus(variant, 0x42, 0x0A);
        let request = Request {
            msg_type: 0x03,
            command_id: CommandId(0x0D3D_0519),
            params: &[0x01, 0x02],
            expect_reply: false,
        };
        let mut tx: Frame = Frame::new();
        let mut rx: Frame = Frame::new();
        assert_eq!(sender.send(&request, &mut tx, &mut rx), Ok(()));

        let peer = SerialIOPlane::new();
        peer.queue_raw(&line.tx_raw(), 0);
        let mut receiver = peer.bus(variant, 0x0A, 0x42);
        assert_eq!(receiver.receive(&mut rx), Ok(()));
        assert_eq!(rx.as_slice(), tx.as_slice());

        let telegram = Telegram::decode(variant, &rx).unwrap();
        assert_eq!(telegram.source, 0x42);
        assert_eq!(telegram.dest, 0x0A);
        assert_eq!(telegram.msg_type, 0x03);
        assert_eq!(telegram.request_command_id(), CommandId(0x0D3D_0519));
        assert_eq!(telegram.payload, &[0x01, 0x02]);
    }
}
