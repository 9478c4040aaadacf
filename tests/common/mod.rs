#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use bsb_proto::{checksum, Bus, BusConfig, BusVariant, Clock, Timing, Transport};
use rand::rngs::mock::StepRng;

/// Time one byte occupies the line at 4800 baud with parity and stop bit.
pub const BYTE_TIME_US: u64 = 2_300;

/// Simulated two-wire bus as seen from one station.
///
/// Time only moves when the engine delays or writes, so every test runs
/// instantly and deterministically.
pub struct SerialInterface {
    now_us: u64,
    /// (arrival time, byte as it appears on the line)
    rx: VecDeque<(u64, u8)>,
    tx: Vec<u8>,
    busy: Vec<(u64, u64)>,
    always_busy: bool,
    collisions: VecDeque<usize>,
    always_collide: bool,
    writes: usize,
    echo: bool,
    in_critical_section: bool,
    critical_sections: usize,
}

#[derive(Clone)]
pub struct SerialIOPlane(Rc<RefCell<SerialInterface>>);

pub type SimBus = Bus<SerialIOPlane, SerialIOPlane, StepRng>;

impl SerialIOPlane {
    pub fn new() -> SerialIOPlane {
        SerialIOPlane(Rc::new(RefCell::new(SerialInterface {
            now_us: 0,
            rx: VecDeque::new(),
            tx: Vec::new(),
            busy: Vec::new(),
            always_busy: false,
            collisions: VecDeque::new(),
            always_collide: false,
            writes: 0,
            echo: false,
            in_critical_section: false,
            critical_sections: 0,
        })))
    }

    /// Create a bus engine on this line with a deterministic backoff sequence.
    pub fn bus(&self, variant: BusVariant, own: u8, dest: u8) -> SimBus {
        init_logging();
        let config = BusConfig::new(variant, own, dest).unwrap();
        Bus::new(self.clone(), self.clone(), StepRng::new(0, 1), config)
    }

    pub fn bus_with_timing(&self, variant: BusVariant, own: u8, dest: u8, timing: Timing) -> SimBus {
        let mut bus = self.bus(variant, own, dest);
        bus.set_timing(timing);
        bus
    }

    pub fn now_us(&self) -> u64 {
        self.0.borrow().now_us
    }

    pub fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }

    /// Put raw line bytes on the bus, all arriving at `at_us`.
    pub fn queue_raw(&self, bytes: &[u8], at_us: u64) {
        self.queue_paced(bytes, at_us, 0);
    }

    /// Put raw line bytes on the bus, one every `gap_us` starting at `at_us`.
    pub fn queue_paced(&self, bytes: &[u8], at_us: u64, gap_us: u64) {
        let mut inner = self.0.borrow_mut();
        for (i, byte) in bytes.iter().enumerate() {
            inner.insert_rx(at_us + i as u64 * gap_us, *byte);
        }
    }

    /// Put a frame on the bus the way a station of `variant` would drive it.
    pub fn queue_frame(&self, variant: BusVariant, frame: &[u8], at_us: u64) {
        self.queue_raw(&to_wire(variant, frame), at_us);
    }

    /// Bytes still waiting to be read, including ones not yet arrived.
    pub fn pending(&self) -> usize {
        self.0.borrow().rx.len()
    }

    /// Bytes the line accepted from this station.
    pub fn tx_raw(&self) -> Vec<u8> {
        self.0.borrow().tx.clone()
    }

    /// Accepted bytes with the polarity of `variant` undone.
    pub fn tx_frame(&self, variant: BusVariant) -> Vec<u8> {
        to_wire(variant, &self.tx_raw())
    }

    pub fn set_always_busy(&self, busy: bool) {
        self.0.borrow_mut().always_busy = busy;
    }

    /// Another station drives the line during [start, end).
    pub fn busy_between(&self, start_us: u64, end_us: u64) {
        self.0.borrow_mut().busy.push((start_us, end_us));
    }

    /// The write with the given (zero based) index collides.
    pub fn collide_on_write(&self, index: usize) {
        self.0.borrow_mut().collisions.push_back(index);
    }

    pub fn set_always_collide(&self, collide: bool) {
        self.0.borrow_mut().always_collide = collide;
    }

    /// Hear our own transmissions, as a real two-wire bus does.
    pub fn set_echo(&self, echo: bool) {
        self.0.borrow_mut().echo = echo;
    }

    pub fn writes(&self) -> usize {
        self.0.borrow().writes
    }

    pub fn critical_sections(&self) -> usize {
        self.0.borrow().critical_sections
    }
}

impl SerialInterface {
    fn insert_rx(&mut self, at_us: u64, byte: u8) {
        let pos = self
            .rx
            .iter()
            .position(|(t, _)| *t > at_us)
            .unwrap_or_else(|| self.rx.len());
        self.rx.insert(pos, (at_us, byte));
    }

    fn arrived(&self) -> usize {
        self.rx.iter().take_while(|(t, _)| *t <= self.now_us).count()
    }
}

impl Transport for SerialIOPlane {
    fn available(&mut self) -> usize {
        self.0.borrow().arrived()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut inner = self.0.borrow_mut();
        if inner.arrived() > 0 {
            inner.rx.pop_front().map(|(_, byte)| byte)
        } else {
            None
        }
    }

    fn write_byte(&mut self, byte: u8) -> usize {
        let mut inner = self.0.borrow_mut();
        assert!(inner.in_critical_section, "write outside of a critical section");
        let index = inner.writes;
        inner.writes += 1;
        inner.now_us += BYTE_TIME_US;
        if inner.always_collide || inner.collisions.front() == Some(&index) {
            inner.collisions.pop_front();
            return 0;
        }
        inner.tx.push(byte);
        if inner.echo {
            let now = inner.now_us;
            inner.insert_rx(now, byte);
        }
        1
    }

    fn line_busy(&mut self) -> bool {
        let inner = self.0.borrow();
        inner.always_busy
            || inner
                .busy
                .iter()
                .any(|(start, end)| (*start..*end).contains(&inner.now_us))
    }

    fn critical_section<R, F>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        {
            let mut inner = self.0.borrow_mut();
            assert!(!inner.in_critical_section, "nested critical section");
            inner.in_critical_section = true;
            inner.critical_sections += 1;
        }
        let result = f(self);
        self.0.borrow_mut().in_critical_section = false;
        result
    }
}

impl Clock for SerialIOPlane {
    fn now_ms(&self) -> u64 {
        self.0.borrow().now_us / 1000
    }

    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().now_us += u64::from(us);
    }
}

/// Apply (or undo) the line polarity of `variant`.
pub fn to_wire(variant: BusVariant, bytes: &[u8]) -> Vec<u8> {
    if variant.layout().inverted {
        bytes.iter().map(|b| !b).collect()
    } else {
        bytes.to_vec()
    }
}

/// `body` followed by its checksum.
pub fn sealed(variant: BusVariant, body: &[u8]) -> Vec<u8> {
    let mut frame = body.to_vec();
    frame.resize(body.len() + variant.layout().checksum_len, 0);
    checksum::seal(variant, &mut frame);
    frame
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
