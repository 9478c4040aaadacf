use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serialport::{DataBits, Parity, SerialPort};
use std::convert::TryFrom;
use std::io::{Read, Write};
use std::iter::Peekable;
use std::str::SplitWhitespace;

use bsb_proto::{
    Address, Bus, BusConfig, BusVariant, Frame, Request, StdClock, Telegram, Transport,
};

/// Telegram types used by the commands below.
const TYPE_INFO: u8 = 0x02;
const TYPE_SET: u8 = 0x03;
const TYPE_QUERY: u8 = 0x06;

struct SerialTransport(Box<dyn SerialPort>);

impl Transport for SerialTransport {
    fn available(&mut self) -> usize {
        self.0.bytes_to_read().map_or(0, |n| n as usize)
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8];
        self.0.read_exact(&mut byte).ok().map(|_| byte[0])
    }

    fn write_byte(&mut self, byte: u8) -> usize {
        self.0.write(&[byte]).unwrap_or(0)
    }

    // The adapter gives no access to the line level, so pending input is
    // the best sign of another station talking.
    fn line_busy(&mut self) -> bool {
        self.available() > 0
    }
}

type SerialBus = Bus<SerialTransport, StdClock, StdRng>;

fn cmd_query(args: &mut CmdScanner, bus: &mut SerialBus) -> Result<()> {
    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    bus.send(&Request::query(TYPE_QUERY, args.parse_hex()?), &mut tx, &mut rx)?;
    print_frame(bus.variant(), &rx);
    Ok(())
}

fn cmd_set(args: &mut CmdScanner, bus: &mut SerialBus, msg_type: u8) -> Result<()> {
    let command_id = args.parse_hex()?;
    let mut params = Vec::new();
    while args.peek().is_some() {
        params.push(u8::try_from(args.parse_hex()?).context("Parameter out of range")?);
    }
    let request = Request {
        msg_type,
        command_id: command_id.into(),
        params: &params,
        expect_reply: msg_type == TYPE_SET,
    };
    let mut tx: Frame = Frame::new();
    let mut rx: Frame = Frame::new();
    bus.send(&request, &mut tx, &mut rx)?;
    if request.expect_reply {
        print_frame(bus.variant(), &rx);
    }
    Ok(())
}

fn cmd_listen(args: &mut CmdScanner, bus: &mut SerialBus) -> Result<()> {
    let seconds: u64 = args.next()?.parse().context("Parse error")?;
    let until = std::time::Instant::now() + std::time::Duration::from_secs(seconds);
    let mut rx: Frame = Frame::new();
    while std::time::Instant::now() < until {
        match bus.receive(&mut rx) {
            Ok(()) => print_frame(bus.variant(), &rx),
            Err(_) => std::thread::sleep(std::time::Duration::from_millis(5)),
        }
    }
    Ok(())
}

fn cmd_bus(args: &mut CmdScanner, bus: &mut SerialBus) -> Result<()> {
    let variant = match args.next()? {
        "bsb" => BusVariant::Bsb,
        "lpb" => BusVariant::Lpb,
        "pps" => BusVariant::Pps,
        other => bail!("Unknown bus {}", other),
    };
    let own = args.parse_address()?;
    let dest = args.parse_address()?;
    println!("{:?}", bus.configure(variant, own, dest));
    Ok(())
}

fn print_frame(variant: BusVariant, frame: &[u8]) {
    match Telegram::decode(variant, frame) {
        Ok(t) => println!(
            "{:02X} -> {:02X} type {:02X} command {:08X} {:02X?}",
            t.source,
            t.dest,
            t.msg_type,
            t.reply_command_id().0,
            t.payload
        ),
        Err(_) => println!("{:02X?}", frame),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args();
    args.next(); // Skip program name
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let serial = serialport::new(&port, 4800)
        .data_bits(DataBits::Eight)
        .parity(Parity::Odd)
        .timeout(std::time::Duration::from_millis(100))
        .open()
        .with_context(|| format!("Failed to open serial port {}", port))?;

    let config = BusConfig::new(BusVariant::Bsb, 0x42, 0x00)?;
    let mut bus = Bus::new(
        SerialTransport(serial),
        StdClock::new(),
        StdRng::from_entropy(),
        config,
    );

    let mut stdout = std::io::stdout();
    loop {
        print!(">> ");
        stdout.flush()?;
        let mut cmd = String::new();
        let mut scan = CmdScanner::read_stdin(&mut cmd)?;
        if let Err(err) = match scan.next() {
            Err(_) => continue,
            Ok("query") | Ok("q") => cmd_query(&mut scan, &mut bus),
            Ok("set") => cmd_set(&mut scan, &mut bus, TYPE_SET),
            Ok("info") => cmd_set(&mut scan, &mut bus, TYPE_INFO),
            Ok("listen") => cmd_listen(&mut scan, &mut bus),
            Ok("bus") => cmd_bus(&mut scan, &mut bus),
            Ok("quit") => break,
            Ok(cmd) => {
                println!("Unknown command {}", cmd);
                continue;
            }
        } {
            println!("{:?}", err)
        }
    }
    Ok(())
}

struct CmdScanner<'a> {
    splt: Peekable<SplitWhitespace<'a>>,
}

impl<'a> CmdScanner<'a> {
    fn read_stdin(buf: &'a mut String) -> Result<Self> {
        buf.clear();
        std::io::stdin().read_line(buf)?;
        let splt = buf.split_whitespace().peekable();
        Ok(Self { splt })
    }
    fn next(&mut self) -> Result<&str> {
        self.splt.next().context("End of stream")
    }
    fn peek(&mut self) -> Option<&&str> {
        self.splt.peek()
    }
    fn parse_hex(&mut self) -> Result<u32> {
        let word = self.next()?;
        u32::from_str_radix(word.trim_start_matches("0x"), 16).context("Parse error")
    }
    /// An optional address, `-` keeps the current one.
    fn parse_address(&mut self) -> Result<Option<Address>> {
        match self.splt.next() {
            None | Some("-") => Ok(None),
            Some(word) => {
                let value = u8::from_str_radix(word.trim_start_matches("0x"), 16)
                    .context("Parse error")?;
                Ok(Some(Address::new(value)?))
            }
        }
    }
}
