// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod analog;
mod exint;
mod hw;
mod mutex;
mod ports;
mod pwm;
mod system;
mod usi_uart;

use crate::{
    hw::{Peripherals, interrupt, mcu},
    mutex::{MainCtx, unwrap_option},
    ports::{PORTA, PORTB, PortA, PortB},
};

fn wdt_init() {
    // SAFETY: The asm code only accesses the WDT registers
    //         which are not accessed from anywhere else in the program.
    unsafe {
        // Enable WDT with timeout 32 ms
        core::arch::asm!(
            "ldi {tmp}, 0x18", // WDCE=1, WDE=1
            "out {WDTCR}, {tmp}",
            "ldi {tmp}, 0x09", // WDE=1, WDP=1
            "out {WDTCR}, {tmp}",
            tmp = out(reg_upper) _,
            WDTCR = const 0x21,
            options(nostack, preserves_flags)
        );
    }
}

fn wdt_poke(_wp: &mcu::WDT) {
    avr_device::asm::wdr();
}

#[avr_device::entry]
fn main() -> ! {
    wdt_init();

    let dp = unwrap_option(Peripherals::take());

    // SAFETY:
    // This is the context handle for the main() function.
    // Holding a reference to this object proves that the holder
    // is running in main() context.
    let m = unsafe {
        MainCtx::new_with_init(|c| {
            PORTA.init(c, PortA { PORTA: dp.PORTA });
            PORTB.init(c, PortB { PORTB: dp.PORTB });
            analog::DP.init(c, analog::Dp { ADC: dp.ADC });
            pwm::DP.init(c, pwm::Dp { TC1: dp.TC1 });
            exint::DP.init(c, exint::Dp { EXINT: dp.EXINT });
            usi_uart::DP.init(
                c,
                usi_uart::Dp {
                    USI: dp.USI,
                    TC0: dp.TC0,
                },
            );

            PORTA.setup(c);
            PORTB.setup(c);
            usi_uart::DP.setup(c);
            exint::DP.setup(c);
            pwm::DP.setup(c);
            analog::DP.setup(c);
            system::init(c);
        })
    };

    // SAFETY: This must be after construction of MainCtx
    //         and after initialization of static MainInit variables.
    unsafe { interrupt::enable() };

    loop {
        system::run(&m);
        wdt_poke(&dp.WDT);
    }
}

// vim: ts=4 sw=4 expandtab
