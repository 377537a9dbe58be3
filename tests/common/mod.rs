#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use drive_session::power::{PowerState, SimulatedPowerSource, StaticBootMetadata};
use drive_session::session::{SessionAnnotation, SessionControllerBuilder, SessionControllerCallback};
use drive_session::time::ManualClock;
use drive_session::SessionController;

pub const BOOT_REASON: &str = "reboot,factory_reset";
pub const BOOT_COUNT: i32 = 5;

/// Listener that keeps every annotation it hears.
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<SessionAnnotation>>,
}

impl Recorder {
    pub fn seen(&self) -> Vec<SessionAnnotation> {
        self.seen.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl SessionControllerCallback for Recorder {
    fn on_session_state_changed(&self, annotation: &SessionAnnotation) {
        self.seen.lock().unwrap().push(annotation.clone());
    }
}

/// Listener that writes its name into a shared log, to observe ordering.
pub struct Named {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<(&'static str, SessionAnnotation)>>>,
}

impl SessionControllerCallback for Named {
    fn on_session_state_changed(&self, annotation: &SessionAnnotation) {
        self.log.lock().unwrap().push((self.name, annotation.clone()));
    }
}

pub struct Harness {
    pub power: Arc<SimulatedPowerSource>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(initial: PowerState) -> Self {
        Self {
            power: Arc::new(SimulatedPowerSource::new(initial)),
            clock: Arc::new(ManualClock::new(10_000, 1_700_000_000_000)),
        }
    }

    pub fn builder(&self) -> SessionControllerBuilder {
        SessionController::builder()
            .power_source(self.power.clone())
            .boot_metadata(Arc::new(StaticBootMetadata::new(BOOT_REASON, BOOT_COUNT)))
            .clock(self.clock.clone())
    }

    pub fn controller(&self) -> SessionController {
        self.builder().build().unwrap()
    }
}
