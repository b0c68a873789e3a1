// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    hw::mcu,
    mutex::{IrqCtx, LazyMainInit, MainInitCtx},
    system::CONTROLLER,
};
use thermoctl::{Acquisition, Busy};

#[allow(non_snake_case)]
pub struct Dp {
    pub ADC: mcu::ADC,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

/// Widen a 10 bit conversion result to the 12 bit scale of the controller.
#[inline(always)]
fn widen(adc: u16) -> u16 {
    (adc << 2) | (adc >> 8)
}

impl Dp {
    #[rustfmt::skip]
    pub fn setup(&self, _c: &MainInitCtx) {
        // PA0, single ended, Vcc reference.
        self.ADC.admux().write(|w| w.refs().vcc().mux().adc0());
        self.ADC.adcsrb().write(|w| w);
        self.ADC.didr0().write(|w| w.adc0d().set_bit());

        // 16 MHz / 128 = 125 kHz ADC clock.
        self.ADC.adcsra().write(|w| {
            w.adps().prescaler_128()
             .adie().set_bit()
             .adif().set_bit()
             .adsc().clear_bit()
             .aden().set_bit()
        });
    }
}

/// The ADC as acquisition source of the control loop.
pub struct Adc;

impl Acquisition for Adc {
    fn rearm(&mut self) -> Result<(), Busy> {
        let adcsra = DP.ADC.adcsra();
        if adcsra.read().adsc().bit_is_set() {
            Err(Busy)
        } else {
            // Writing ADIF=0 keeps a pending flag untouched.
            adcsra.modify(|_, w| w.adif().clear_bit().adsc().set_bit());
            Ok(())
        }
    }
}

/// ADC conversion complete interrupt.
pub fn irq_handler_adc(c: &IrqCtx) {
    let raw = widen(DP.ADC.adc().read().bits());
    CONTROLLER.on_conversion_complete(c.cs(), raw, &mut Adc);
}

// vim: ts=4 sw=4 expandtab
