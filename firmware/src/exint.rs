// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    hw::mcu,
    mutex::{CriticalSection, IrqCtx, LazyMainInit, MainInitCtx},
};

#[allow(non_snake_case)]
pub struct Dp {
    pub EXINT: mcu::EXINT,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

/// PB0 / PCINT8: UART DI.
const PCINT_UART_RX: u8 = 1 << 0;

impl Dp {
    pub fn setup(&self, c: &MainInitCtx) {
        self.EXINT.pcmsk0().write(|w| w.set(0));
        uart_rx_pcint(c.cs(), true);
        self.EXINT.gifr().write(|w| w.pcif().set_bit());
        self.EXINT.gimsk().write(|w| w.pcie().set(0x3));
    }
}

/// Enable or disable the start bit detection of the UART.
pub fn uart_rx_pcint(_cs: CriticalSection<'_>, enable: bool) {
    if enable {
        DP.EXINT.gifr().write(|w| w.pcif().set_bit());
        DP.EXINT.pcmsk1().write(|w| w.set(PCINT_UART_RX));
    } else {
        DP.EXINT.pcmsk1().write(|w| w.set(0));
    }
}

pub fn irq_handler_pcint(c: &IrqCtx) {
    crate::usi_uart::irq_handler_pcint(c);
}

// vim: ts=4 sw=4 expandtab
