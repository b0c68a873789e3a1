// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

pub use attiny::{self as mcu, Peripherals};
pub use avr_device::attiny861a as attiny;
pub use avr_device::interrupt;

use crate::mutex::IrqCtx;

macro_rules! define_isr {
    ($name:ident, $handler:path) => {
        #[avr_device::interrupt(attiny861a)]
        fn $name() {
            // SAFETY: We are inside of an interrupt handler.
            // Therefore, it is safe to construct an `IrqCtx`.
            let c = unsafe { IrqCtx::new() };
            $handler(&c);
        }
    };
}

define_isr!(ADC, crate::analog::irq_handler_adc);
define_isr!(TIMER1_OVF, crate::pwm::irq_handler_timer1_ovf);
define_isr!(PCINT, crate::exint::irq_handler_pcint);
define_isr!(USI_OVF, crate::usi_uart::irq_handler_usi_ovf);

// vim: ts=4 sw=4 expandtab
