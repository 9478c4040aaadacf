use nom::bytes::complete::take;
use nom::combinator::{all_consuming, map, verify};
use nom::number::complete::{be_u16, u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::layout::FrameLayout;
use crate::telegram::Telegram;

type Buf = [u8];

pub(crate) mod bsb {
    use super::*;

    const LAYOUT: &FrameLayout = &FrameLayout::BSB;
    const SOURCE_FLAG: u8 = 0x80;

    /// SOF, source, dest, length, type, command-id, payload, CRC.
    pub(crate) fn telegram(buf: &Buf) -> IResult<&Buf, Telegram<'_>> {
        all_consuming(telegram_fields)(buf)
    }

    fn telegram_fields(buf: &Buf) -> IResult<&Buf, Telegram<'_>> {
        let (buf, (_sof, source, dest, len, msg_type, command)) =
            tuple((sof(LAYOUT), u8, u8, declared_len(LAYOUT), u8, command_id))(buf)?;
        let (buf, payload) = take(payload_len(LAYOUT, len))(buf)?;
        let (buf, _crc) = be_u16(buf)?;
        Ok((
            buf,
            Telegram {
                source: source & !SOURCE_FLAG,
                dest,
                msg_type,
                command,
                payload,
            },
        ))
    }
}

pub(crate) mod lpb {
    use super::*;

    const LAYOUT: &FrameLayout = &FrameLayout::LPB;

    /// SOF, length, dest, source, four control bytes, type, command-id,
    /// payload, checksum.
    pub(crate) fn telegram(buf: &Buf) -> IResult<&Buf, Telegram<'_>> {
        all_consuming(telegram_fields)(buf)
    }

    fn telegram_fields(buf: &Buf) -> IResult<&Buf, Telegram<'_>> {
        let (buf, (_sof, len, dest, source, _control, msg_type, command)) = tuple((
            sof(LAYOUT),
            declared_len(LAYOUT),
            u8,
            u8,
            take(4usize),
            u8,
            command_id,
        ))(buf)?;
        let (buf, payload) = take(payload_len(LAYOUT, len))(buf)?;
        let (buf, _checksum) = be_u16(buf)?;
        Ok((
            buf,
            Telegram {
                source,
                dest,
                msg_type,
                command,
                payload,
            },
        ))
    }
}

fn sof<'a>(layout: &'static FrameLayout) -> impl FnMut(&'a Buf) -> IResult<&'a Buf, u8> {
    verify(u8, move |byte: &u8| layout.is_sof(*byte))
}

/// The length field, accepted only if it leaves room for a complete header.
fn declared_len<'a>(layout: &'static FrameLayout) -> impl FnMut(&'a Buf) -> IResult<&'a Buf, u8> {
    verify(u8, move |len: &u8| {
        layout
            .declared_len(0)
            .map_or(false, |min| usize::from(*len) >= min)
    })
}

fn payload_len(layout: &FrameLayout, declared: u8) -> usize {
    layout
        .declared_len(0)
        .map_or(0, |min| usize::from(declared).saturating_sub(min))
}

fn command_id(buf: &Buf) -> IResult<&Buf, [u8; 4]> {
    map(take(4usize), |b: &Buf| [b[0], b[1], b[2], b[3]])(buf)
}
