//! The scan loop: expanders in, debounced events out, processor driven.

use crate::diag::{KeyRecord, Log, PressRelease};
use crate::event_queue::EventQueue;
use crate::expander::IoExpander;
use crate::key_event::KeyEvent;
use crate::key_switch::{KeySwitch, Transition};
use crate::processor::Processor;

const NANOS_PER_MS: u64 = 1_000_000;

/// A monotonic nanosecond time source.
///
/// The scanner is the only component that reads time; the processor
/// receives `now` from its caller, which keeps the whole state machine
/// runnable against synthetic time.
pub trait Clock {
    /// The current monotonic time in nanoseconds.
    fn now_ns(&mut self) -> u64;
}

impl<F: FnMut() -> u64> Clock for F {
    fn now_ns(&mut self) -> u64 {
        self()
    }
}

/// Scan loop pacing.
#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// Minimum interval between expander scans, in milliseconds.
    /// Around 200 Hz is plenty for human finger transitions.
    pub scan_interval_ms: u32,
    /// Minimum interval between processor runs, in milliseconds. Kept
    /// short so hold timeouts stay responsive.
    pub process_interval_ms: u32,
    /// Upper bound on events handed to the processor per run, so a
    /// burst (e.g. after a long bus stall) cannot monopolize a slice.
    pub max_events_per_cycle: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            scan_interval_ms: 5,
            process_interval_ms: 1,
            max_events_per_cycle: 5,
        }
    }
}

/// Polls the expanders, debounces, queues, and drives the processor.
///
/// `update` is meant to be called from the main loop as often as the
/// caller likes; the configured intervals gate the actual work. The
/// scanner owns the bus for its whole life, so nothing else can talk
/// over a scan.
pub struct Scanner<'a, I2C, P, C> {
    bus: I2C,
    expanders: &'a mut [&'a mut dyn IoExpander<I2C>],
    switches: &'a mut [KeySwitch],
    processor: P,
    clock: C,
    config: ScanConfig,
    queue: EventQueue,
    last_scan_ns: u64,
    last_process_ns: u64,
    bus_faults: u32,
    log: Option<&'a mut Log>,
}

impl<'a, I2C, P, C> Scanner<'a, I2C, P, C>
where
    P: Processor,
    C: Clock,
{
    /// Creates a scanner and configures every device, ignoring
    /// failures: a device that does not answer now is retried when it
    /// is first read.
    pub fn new(
        mut bus: I2C,
        expanders: &'a mut [&'a mut dyn IoExpander<I2C>],
        switches: &'a mut [KeySwitch],
        processor: P,
        clock: C,
    ) -> Self {
        for expander in expanders.iter_mut() {
            let _ = expander.init_device(&mut bus);
        }
        Scanner {
            bus,
            expanders,
            switches,
            processor,
            clock,
            config: ScanConfig::default(),
            queue: EventQueue::new(),
            last_scan_ns: 0,
            last_process_ns: 0,
            bus_faults: 0,
            log: None,
        }
    }

    /// Overrides the default pacing.
    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a diagnostic log recording every committed transition.
    pub fn with_log(mut self, log: &'a mut Log) -> Self {
        self.log = Some(log);
        self
    }

    /// The processor.
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// The processor, for reaching its sink from the transport loop.
    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    /// Bus operations that failed since construction.
    pub fn bus_faults(&self) -> u32 {
        self.bus_faults
    }

    /// Events lost to queue overflow since construction.
    pub fn dropped_events(&self) -> u32 {
        self.queue.dropped()
    }

    /// Events currently queued.
    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    /// Runs one cooperative slice: a scan pass if one is due, then a
    /// processing pass if one is due. Returns `true` when a scan ran or
    /// events were delivered, so an idle caller can yield.
    pub fn update(&mut self) -> bool {
        let now = self.clock.now_ns();
        let mut did_work = false;
        if now.saturating_sub(self.last_scan_ns)
            >= u64::from(self.config.scan_interval_ms) * NANOS_PER_MS
        {
            self.last_scan_ns = now;
            self.scan_once(now);
            did_work = true;
        }
        if now.saturating_sub(self.last_process_ns)
            >= u64::from(self.config.process_interval_ms) * NANOS_PER_MS
        {
            self.last_process_ns = now;
            did_work |= self.process_pending(now);
        }
        did_work
    }

    /// Reads every expander once and queues the committed transitions.
    /// A failing device is skipped for this pass and retried on the
    /// next; it cannot poison the others.
    fn scan_once(&mut self, now_ns: u64) {
        for (index, expander) in self.expanders.iter_mut().enumerate() {
            let pins = match expander.read_device(&mut self.bus) {
                Ok(pins) => pins,
                Err(_) => {
                    self.bus_faults = self.bus_faults.wrapping_add(1);
                    continue;
                }
            };
            for pin in 0..pins.len() {
                let id = match expander.switch(pin) {
                    Some(id) => id,
                    None => continue,
                };
                let switch = match self.switches.get_mut(id.index()) {
                    Some(s) => s,
                    None => continue,
                };
                let transition = match switch.update(pins.get(pin)) {
                    Some(t) => t,
                    None => continue,
                };
                if let Some(log) = self.log.as_mut() {
                    log.log(KeyRecord {
                        timestamp_ns: now_ns,
                        expander: index as u8,
                        pin: pin as u8,
                        event: match transition {
                            Transition::Pressed => PressRelease::Press,
                            Transition::Released => PressRelease::Release,
                        },
                    });
                }
                self.queue
                    .enqueue(KeyEvent::from_transition(transition, id), now_ns);
            }
        }
    }

    /// Hands queued events to the processor, up to the per-cycle cap,
    /// then ticks it so hold timeouts advance even on an idle queue.
    fn process_pending(&mut self, now_ns: u64) -> bool {
        let mut delivered = 0;
        while delivered < self.config.max_events_per_cycle {
            let queued = match self.queue.dequeue() {
                Some(q) => q,
                None => break,
            };
            self.processor
                .put(queued.event, queued.timestamp_ns, &*self.switches);
            delivered += 1;
        }
        self.processor.tick(now_ns);
        delivered > 0
    }
}
