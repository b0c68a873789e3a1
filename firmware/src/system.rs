// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    analog::Adc,
    mutex::{MainCtx, MainInitCtx, reset_system},
    ports::PORTB,
    pwm::Pwm,
};
use thermoctl::{Config, Controller};

/// Timer 1 overflows every 4 ms. Run the actuator every 10th overflow.
pub const CONTROLLER_CONFIG: Config = Config::DEFAULT.with_tick_divider(10);

pub static CONTROLLER: Controller = Controller::new(CONTROLLER_CONFIG);

const PORTB_BIT_DEBUG: usize = 6;

#[allow(dead_code)]
pub fn debug_toggle() {
    PORTB.set(PORTB_BIT_DEBUG, !PORTB.get(PORTB_BIT_DEBUG));
}

pub fn init(c: &MainInitCtx) {
    if CONTROLLER.config().validate().is_err() {
        reset_system();
    }
    CONTROLLER.init(c.cs(), &mut Pwm);
    CONTROLLER.start_acquisition(c.cs(), &mut Adc);
}

pub fn run(_m: &MainCtx<'_>) {
    let failed = CONTROLLER.run_estimator().is_err();
    if cfg!(feature = "debug") {
        // High while the estimate is stale.
        PORTB.set(PORTB_BIT_DEBUG, failed);
    }
}

// vim: ts=4 sw=4 expandtab
