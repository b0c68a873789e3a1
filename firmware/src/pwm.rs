// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    analog::Adc,
    hw::mcu,
    mutex::{IrqCtx, LazyMainInit, MainInitCtx},
    system::{CONTROLLER, CONTROLLER_CONFIG},
};
use thermoctl::DutyRegister;

/// Timer 1 TOP. One PWM period is TOP + 1 timer ticks.
const PWM_TOP: u16 = CONTROLLER_CONFIG.period;

#[allow(non_snake_case)]
pub struct Dp {
    pub TC1: mcu::TC1,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

impl Dp {
    /// Write a 10 bit timer register.
    ///
    /// The high bits go through the shared TC1H temporary register.
    /// Interrupts must be disabled.
    #[inline(always)]
    fn write10(&self, value: u16, write_low: impl FnOnce(u8)) {
        // SAFETY: TC1H only holds the two high bits.
        self.TC1.tc1h().write(|w| unsafe { w.bits((value >> 8) as u8 & 0x03) });
        write_low(value as u8);
    }

    // Timer 1 configuration:
    // CS: 64 -> 4 us per timer tick.
    // Fast PWM with TOP=1000 -> 4.004 ms period.
    // Output on OC1B (PB3), set at BOTTOM, cleared on compare match.
    #[rustfmt::skip]
    pub fn setup(&self, _c: &MainInitCtx) {
        self.TC1.tccr1b().write(|w| w);
        self.write10(0, |v| { self.TC1.tcnt1().write(|w| w.set(v)); });
        self.write10(PWM_TOP, |v| { self.TC1.ocr1c().write(|w| w.set(v)); });
        self.write10(0, |v| { self.TC1.ocr1b().write(|w| w.set(v)); });
        self.TC1.tccr1d().write(|w| w.wgm1().pwm_fast());
        self.TC1.tccr1c().write(|w| w);
        self.TC1.tccr1e().write(|w| w);
        self.TC1.tccr1a().write(|w| {
            w.pwm1b().set_bit()
             .com1b().match_clear()
        });
        self.TC1.tifr().write(|w| w.tov1().set_bit());
        self.TC1.timsk().modify(|_, w| w.toie1().set_bit());
        self.TC1.tccr1b().write(|w| w.cs1().prescale_64());
    }
}

/// The OC1B compare register.
pub struct Pwm;

impl DutyRegister for Pwm {
    fn set_duty(&mut self, duty: u16) {
        // Called from init and from the timer ISR only. Interrupts are disabled.
        DP.write10(duty.min(PWM_TOP), |v| { DP.TC1.ocr1b().write(|w| w.set(v)); });
    }
}

/// Timer 1 overflow interrupt. The control tick.
pub fn irq_handler_timer1_ovf(c: &IrqCtx) {
    CONTROLLER.on_tick(c.cs(), &mut Adc, &mut Pwm);
}

// vim: ts=4 sw=4 expandtab
