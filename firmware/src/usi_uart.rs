// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    exint::uart_rx_pcint,
    hw::mcu,
    mutex::{CriticalSection, IrqCtx, LazyMainInit, MainInitCtx},
    ports::PORTB,
    system::CONTROLLER,
};
use core::cell::Cell;
use critical_section::Mutex;
use thermoctl::ByteLink;

const FCPU: u32 = 16_000_000;
const BAUD: u32 = 9_600;
const PORTB_BIT_DI: usize = 0;
const PORTB_BIT_DO: usize = 1;
const TC0_PS: u32 = 8;
const TC0_OCR: u8 = (FCPU / (BAUD * TC0_PS)) as u8;
/// Delay from start bit edge to the first sample point (start bit center).
/// Includes some compensation for the interrupt latency.
const TC0_RX_PRELOAD: u8 = TC0_OCR / 2 + 8;

#[allow(non_snake_case)]
pub struct Dp {
    pub USI: mcu::USI,
    pub TC0: mcu::TC0,
}

// SAFETY: Is initialized when constructing the MainCtx.
pub static DP: LazyMainInit<Dp> = unsafe { LazyMainInit::uninit() };

fn bit_rev(mut data: u8) -> u8 {
    data = (data & 0xF0) >> 4 | (data & 0x0F) << 4;
    data = (data & 0xCC) >> 2 | (data & 0x33) << 2;
    data = (data & 0xAA) >> 1 | (data & 0x55) << 1;
    data
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mode {
    /// Waiting for a start bit.
    Idle,
    /// Receiving a frame.
    Rx,
    /// Transmitting start bit and first data bits.
    Tx0,
    /// Transmitting last data bits and stop bit.
    Tx1,
}

static MODE: Mutex<Cell<Mode>> = Mutex::new(Cell::new(Mode::Idle));
static TXDATA: Mutex<Cell<u8>> = Mutex::new(Cell::new(0));

impl Dp {
    pub fn setup(&self, _c: &MainInitCtx) {
        self.USI.usidr().write(|w| w.set(0xFF));
        self.USI.usicr().write(|w| w);
        self.TC0.tccr0b().write(|w| w);
    }

    fn timer_stop(&self) {
        self.TC0.tccr0b().write(|w| w);
    }

    /// Run timer 0 in CTC mode with one bit period.
    #[rustfmt::skip]
    fn timer_start(&self, preload: u8) {
        self.TC0.tccr0a().write(|w| w.ctc0().set_bit());
        self.TC0.tcnt0h().write(|w| w);
        self.TC0.tcnt0l().write(|w| w.set(preload));
        self.TC0.ocr0a().write(|w| w.set(TC0_OCR));
        self.TC0.tccr0b().write(|w| w.cs0().prescale_8());
    }

    #[rustfmt::skip]
    fn usi_start(&self, data: u8, count: u8) {
        self.USI.usidr().write(|w| w.set(data));
        self.USI.usisr().write(|w| {
            w.usicnt().set(16 - count)
             .usioif().set_bit()
        });
        self.USI.usicr().write(|w| {
            w.usioie().set_bit()
             .usiwm().three_wire()
             .usics().tc0()
        });
    }

    fn usi_stop(&self) {
        self.USI.usicr().modify(|_, w| w.usioie().clear_bit());
        self.USI.usisr().modify(|_, w| w.usioif().set_bit());
    }
}

/// Pin change interrupt on DI. Start bit detection.
pub fn irq_handler_pcint(c: &IrqCtx) {
    let cs = c.cs();
    let mode = MODE.borrow(cs);
    if mode.get() == Mode::Idle && !PORTB.get(PORTB_BIT_DI) {
        uart_rx_pcint(cs, false);

        // Sample the start bit and 8 data bits.
        // The start bit is shifted out of USIDR at overflow.
        DP.timer_start(TC0_RX_PRELOAD);
        DP.usi_start(0xFF, 9);

        mode.set(Mode::Rx);
    }
}

#[rustfmt::skip]
pub fn irq_handler_usi_ovf(c: &IrqCtx) {
    let cs = c.cs();
    let mode = MODE.borrow(cs);
    match mode.get() {
        Mode::Idle => {
            DP.usi_stop();
        }
        Mode::Rx => {
            let data = bit_rev(DP.USI.usidr().read().bits());

            DP.timer_stop();
            DP.usi_stop();
            DP.USI.usidr().write(|w| w.set(0xFF));

            mode.set(Mode::Idle);
            CONTROLLER.on_byte_received(cs, data, &mut Uart(cs));

            if mode.get() == Mode::Idle {
                // No response in flight.
                uart_rx_pcint(cs, true);
            }
        }
        Mode::Tx0 => {
            let data = TXDATA.borrow(cs).get();
            DP.USI.usidr().write(|w| w.set((data << 3) | 0x07));
            DP.USI.usisr().write(|w| {
                w.usicnt().set(16 - 6)
                 .usioif().set_bit()
            });

            mode.set(Mode::Tx1);
        }
        Mode::Tx1 => {
            DP.USI.usidr().write(|w| w.set(0xFF));
            DP.usi_stop();
            DP.timer_stop();

            PORTB.set(PORTB_BIT_DO, true);
            PORTB.input(PORTB_BIT_DO);

            mode.set(Mode::Idle);
            uart_rx_pcint(cs, true);
        }
    }
}

pub fn uart_tx_cs(cs: CriticalSection<'_>, mut data: u8) -> bool {
    let mode = MODE.borrow(cs);
    match mode.get() {
        Mode::Idle => {
            uart_rx_pcint(cs, false);

            data = bit_rev(data);
            TXDATA.borrow(cs).set(data);

            DP.timer_stop();

            PORTB.set(PORTB_BIT_DO, true);
            PORTB.output(PORTB_BIT_DO);

            // Idle bit, start bit, 3 data bits.
            DP.usi_start((data >> 2) | 0x80, 5);
            DP.USI.usipp().write(|w| w);
            DP.timer_start(0);

            mode.set(Mode::Tx0);
            true
        }
        Mode::Rx | Mode::Tx0 | Mode::Tx1 => false, // busy
    }
}

/// The USI UART as byte link of the control loop.
///
/// Only exists inside of ISRs.
pub struct Uart<'cs>(CriticalSection<'cs>);

impl ByteLink for Uart<'_> {
    fn tx_ready(&self) -> bool {
        MODE.borrow(self.0).get() == Mode::Idle
    }

    fn transmit(&mut self, byte: u8) {
        // tx_ready() was true within the same critical section.
        // The UART is idle and does not refuse the byte.
        let _ = uart_tx_cs(self.0, byte);
    }
}

// vim: ts=4 sw=4 expandtab
