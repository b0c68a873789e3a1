///Number available in the NVIC for configuring priority
pub const NVIC_PRIO_BITS: u8 = 4;
#[doc(hidden)]
pub mod interrupt {
    ///Enumeration of all the interrupts.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    #[repr(u16)]
    pub enum Interrupt {
        ///0 - External Reset, Power-on Reset and Watchdog Reset
        RESET = 0,
        ///1 - External Interrupt 0
        INT0 = 1,
        ///2 - Pin Change Interrupt
        PCINT = 2,
        ///3 - Timer/Counter1 Compare Match 1A
        TIMER1_COMPA = 3,
        ///4 - Timer/Counter1 Compare Match 1B
        TIMER1_COMPB = 4,
        ///5 - Timer/Counter1 Overflow
        TIMER1_OVF = 5,
        ///6 - Timer/Counter0 Overflow
        TIMER0_OVF = 6,
        ///7 - USI Start
        USI_START = 7,
        ///8 - USI Overflow
        USI_OVF = 8,
        ///9 - EEPROM Ready
        EE_RDY = 9,
        ///10 - Analog Comparator
        ANA_COMP = 10,
        ///11 - ADC Conversion Complete
        ADC = 11,
        ///12 - Watchdog Time-Out
        WDT = 12,
        ///13 - External Interrupt 1
        INT1 = 13,
        ///14 - Timer/Counter0 Compare Match A
        TIMER0_COMPA = 14,
        ///15 - Timer/Counter0 Compare Match B
        TIMER0_COMPB = 15,
        ///16 - ADC Conversion Complete
        TIMER0_CAPT = 16,
        ///17 - Timer/Counter1 Compare Match D
        TIMER1_COMPD = 17,
        ///18 - Timer/Counter1 Fault Protection
        FAULT_PROTECTION = 18,
    }
    /// TryFromInterruptError
    #[derive(Debug, Copy, Clone)]
    pub struct TryFromInterruptError(());
    impl Interrupt {
        /// Attempt to convert a given value into an `Interrupt`
        #[inline]
        pub fn try_from(value: u8) -> Result<Self, TryFromInterruptError> {
            match value {
                0 => Ok(Interrupt::RESET),
                1 => Ok(Interrupt::INT0),
                2 => Ok(Interrupt::PCINT),
                3 => Ok(Interrupt::TIMER1_COMPA),
                4 => Ok(Interrupt::TIMER1_COMPB),
                5 => Ok(Interrupt::TIMER1_OVF),
                6 => Ok(Interrupt::TIMER0_OVF),
                7 => Ok(Interrupt::USI_START),
                8 => Ok(Interrupt::USI_OVF),
                9 => Ok(Interrupt::EE_RDY),
                10 => Ok(Interrupt::ANA_COMP),
                11 => Ok(Interrupt::ADC),
                12 => Ok(Interrupt::WDT),
                13 => Ok(Interrupt::INT1),
                14 => Ok(Interrupt::TIMER0_COMPA),
                15 => Ok(Interrupt::TIMER0_COMPB),
                16 => Ok(Interrupt::TIMER0_CAPT),
                17 => Ok(Interrupt::TIMER1_COMPD),
                18 => Ok(Interrupt::FAULT_PROTECTION),
                _ => Err(TryFromInterruptError(())),
            }
        }
    }
}
pub use self::interrupt::Interrupt;
///Analog Comparator
pub type AC = crate::Periph<ac::RegisterBlock, 0x28>;
impl core::fmt::Debug for AC {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("AC").finish()
    }
}
///Analog Comparator
pub mod ac {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        acsra: ACSRA,
        acsrb: ACSRB,
    }
    impl RegisterBlock {
        ///0x00 - Analog Comparator Control And Status Register A
        #[inline(always)]
        pub const fn acsra(&self) -> &ACSRA {
            &self.acsra
        }
        ///0x01 - Analog Comparator Control And Status Register B
        #[inline(always)]
        pub const fn acsrb(&self) -> &ACSRB {
            &self.acsrb
        }
    }
    /**ACSRA (rw) register accessor: Analog Comparator Control And Status Register A

You can [`read`](crate::Reg::read) this register and get [`acsra::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`acsra::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@acsra`] module*/
    pub type ACSRA = crate::Reg<acsra::ACSRA_SPEC>;
    ///Analog Comparator Control And Status Register A
    pub mod acsra {
        ///Register `ACSRA` reader
        pub type R = crate::R<ACSRA_SPEC>;
        ///Register `ACSRA` writer
        pub type W = crate::W<ACSRA_SPEC>;
        /**Analog Comparator Interrupt Mode Select

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum ACIS_A {
            ///0: Interrupt on Toggle
            ON_TOGGLE = 0,
            ///2: Interrupt on Falling Edge
            ON_FALLING_EDGE = 2,
            ///3: Interrupt on Rising Edge
            ON_RISING_EDGE = 3,
        }
        impl From<ACIS_A> for u8 {
            #[inline(always)]
            fn from(variant: ACIS_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for ACIS_A {
            type Ux = u8;
        }
        impl crate::IsEnum for ACIS_A {}
        ///Field `ACIS` reader - Analog Comparator Interrupt Mode Select
        pub type ACIS_R = crate::FieldReader<ACIS_A>;
        impl ACIS_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> Option<ACIS_A> {
                match self.bits {
                    0 => Some(ACIS_A::ON_TOGGLE),
                    2 => Some(ACIS_A::ON_FALLING_EDGE),
                    3 => Some(ACIS_A::ON_RISING_EDGE),
                    _ => None,
                }
            }
            ///Interrupt on Toggle
            #[inline(always)]
            pub fn is_on_toggle(&self) -> bool {
                *self == ACIS_A::ON_TOGGLE
            }
            ///Interrupt on Falling Edge
            #[inline(always)]
            pub fn is_on_falling_edge(&self) -> bool {
                *self == ACIS_A::ON_FALLING_EDGE
            }
            ///Interrupt on Rising Edge
            #[inline(always)]
            pub fn is_on_rising_edge(&self) -> bool {
                *self == ACIS_A::ON_RISING_EDGE
            }
        }
        ///Field `ACIS` writer - Analog Comparator Interrupt Mode Select
        pub type ACIS_W<'a, REG> = crate::FieldWriter<'a, REG, 2, ACIS_A>;
        impl<'a, REG> ACIS_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Interrupt on Toggle
            #[inline(always)]
            pub fn on_toggle(self) -> &'a mut crate::W<REG> {
                self.variant(ACIS_A::ON_TOGGLE)
            }
            ///Interrupt on Falling Edge
            #[inline(always)]
            pub fn on_falling_edge(self) -> &'a mut crate::W<REG> {
                self.variant(ACIS_A::ON_FALLING_EDGE)
            }
            ///Interrupt on Rising Edge
            #[inline(always)]
            pub fn on_rising_edge(self) -> &'a mut crate::W<REG> {
                self.variant(ACIS_A::ON_RISING_EDGE)
            }
        }
        ///Field `ACME` reader - Analog Comparator Multiplexer Enable
        pub type ACME_R = crate::BitReader;
        ///Field `ACME` writer - Analog Comparator Multiplexer Enable
        pub type ACME_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ACIE` reader - Analog Comparator Interrupt Enable
        pub type ACIE_R = crate::BitReader;
        ///Field `ACIE` writer - Analog Comparator Interrupt Enable
        pub type ACIE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ACI` reader - Analog Comparator Interrupt Flag
        pub type ACI_R = crate::BitReader;
        ///Field `ACI` writer - Analog Comparator Interrupt Flag
        pub type ACI_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ACO` reader - Analog Compare Output
        pub type ACO_R = crate::BitReader;
        ///Field `ACBG` reader - Analog Comparator Bandgap Select
        pub type ACBG_R = crate::BitReader;
        ///Field `ACBG` writer - Analog Comparator Bandgap Select
        pub type ACBG_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ACD` reader - Analog Comparator Disable
        pub type ACD_R = crate::BitReader;
        ///Field `ACD` writer - Analog Comparator Disable
        pub type ACD_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:1 - Analog Comparator Interrupt Mode Select
            #[inline(always)]
            pub fn acis(&self) -> ACIS_R {
                ACIS_R::new(self.bits & 3)
            }
            ///Bit 2 - Analog Comparator Multiplexer Enable
            #[inline(always)]
            pub fn acme(&self) -> ACME_R {
                ACME_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Analog Comparator Interrupt Enable
            #[inline(always)]
            pub fn acie(&self) -> ACIE_R {
                ACIE_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Analog Comparator Interrupt Flag
            #[inline(always)]
            pub fn aci(&self) -> ACI_R {
                ACI_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Analog Compare Output
            #[inline(always)]
            pub fn aco(&self) -> ACO_R {
                ACO_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Analog Comparator Bandgap Select
            #[inline(always)]
            pub fn acbg(&self) -> ACBG_R {
                ACBG_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Analog Comparator Disable
            #[inline(always)]
            pub fn acd(&self) -> ACD_R {
                ACD_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:1 - Analog Comparator Interrupt Mode Select
            #[inline(always)]
            pub fn acis(&mut self) -> ACIS_W<'_, ACSRA_SPEC> {
                ACIS_W::new(self, 0)
            }
            ///Bit 2 - Analog Comparator Multiplexer Enable
            #[inline(always)]
            pub fn acme(&mut self) -> ACME_W<'_, ACSRA_SPEC> {
                ACME_W::new(self, 2)
            }
            ///Bit 3 - Analog Comparator Interrupt Enable
            #[inline(always)]
            pub fn acie(&mut self) -> ACIE_W<'_, ACSRA_SPEC> {
                ACIE_W::new(self, 3)
            }
            ///Bit 4 - Analog Comparator Interrupt Flag
            #[inline(always)]
            pub fn aci(&mut self) -> ACI_W<'_, ACSRA_SPEC> {
                ACI_W::new(self, 4)
            }
            ///Bit 6 - Analog Comparator Bandgap Select
            #[inline(always)]
            pub fn acbg(&mut self) -> ACBG_W<'_, ACSRA_SPEC> {
                ACBG_W::new(self, 6)
            }
            ///Bit 7 - Analog Comparator Disable
            #[inline(always)]
            pub fn acd(&mut self) -> ACD_W<'_, ACSRA_SPEC> {
                ACD_W::new(self, 7)
            }
        }
        /**Analog Comparator Control And Status Register A

You can [`read`](crate::Reg::read) this register and get [`acsra::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`acsra::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct ACSRA_SPEC;
        impl crate::RegisterSpec for ACSRA_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`acsra::R`](R) reader structure
        impl crate::Readable for ACSRA_SPEC {}
        ///`write(|w| ..)` method takes [`acsra::W`](W) writer structure
        impl crate::Writable for ACSRA_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets ACSRA to value 0
        impl crate::Resettable for ACSRA_SPEC {}
    }
    /**ACSRB (rw) register accessor: Analog Comparator Control And Status Register B

You can [`read`](crate::Reg::read) this register and get [`acsrb::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`acsrb::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@acsrb`] module*/
    pub type ACSRB = crate::Reg<acsrb::ACSRB_SPEC>;
    ///Analog Comparator Control And Status Register B
    pub mod acsrb {
        ///Register `ACSRB` reader
        pub type R = crate::R<ACSRB_SPEC>;
        ///Register `ACSRB` writer
        pub type W = crate::W<ACSRB_SPEC>;
        ///Field `ACM` reader - Analog Comparator Multiplexer
        pub type ACM_R = crate::FieldReader;
        ///Field `ACM` writer - Analog Comparator Multiplexer
        pub type ACM_W<'a, REG> = crate::FieldWriter<'a, REG, 3, u8, crate::Safe>;
        ///Field `HLEV` reader - Hysteresis Level
        pub type HLEV_R = crate::BitReader;
        ///Field `HLEV` writer - Hysteresis Level
        pub type HLEV_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `HSEL` reader - Hysteresis Select
        pub type HSEL_R = crate::BitReader;
        ///Field `HSEL` writer - Hysteresis Select
        pub type HSEL_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:2 - Analog Comparator Multiplexer
            #[inline(always)]
            pub fn acm(&self) -> ACM_R {
                ACM_R::new(self.bits & 7)
            }
            ///Bit 6 - Hysteresis Level
            #[inline(always)]
            pub fn hlev(&self) -> HLEV_R {
                HLEV_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Hysteresis Select
            #[inline(always)]
            pub fn hsel(&self) -> HSEL_R {
                HSEL_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:2 - Analog Comparator Multiplexer
            #[inline(always)]
            pub fn acm(&mut self) -> ACM_W<'_, ACSRB_SPEC> {
                ACM_W::new(self, 0)
            }
            ///Bit 6 - Hysteresis Level
            #[inline(always)]
            pub fn hlev(&mut self) -> HLEV_W<'_, ACSRB_SPEC> {
                HLEV_W::new(self, 6)
            }
            ///Bit 7 - Hysteresis Select
            #[inline(always)]
            pub fn hsel(&mut self) -> HSEL_W<'_, ACSRB_SPEC> {
                HSEL_W::new(self, 7)
            }
        }
        /**Analog Comparator Control And Status Register B

You can [`read`](crate::Reg::read) this register and get [`acsrb::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`acsrb::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct ACSRB_SPEC;
        impl crate::RegisterSpec for ACSRB_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`acsrb::R`](R) reader structure
        impl crate::Readable for ACSRB_SPEC {}
        ///`write(|w| ..)` method takes [`acsrb::W`](W) writer structure
        impl crate::Writable for ACSRB_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets ACSRB to value 0
        impl crate::Resettable for ACSRB_SPEC {}
    }
}
///Analog-to-Digital Converter
pub type ADC = crate::Periph<adc::RegisterBlock, 0x21>;
impl core::fmt::Debug for ADC {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("ADC").finish()
    }
}
///Analog-to-Digital Converter
pub mod adc {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        didr0: DIDR0,
        didr1: DIDR1,
        adcsrb: ADCSRB,
        adc: ADC,
        adcsra: ADCSRA,
        admux: ADMUX,
    }
    impl RegisterBlock {
        ///0x00 - Digital Input Disable Register 0
        #[inline(always)]
        pub const fn didr0(&self) -> &DIDR0 {
            &self.didr0
        }
        ///0x01 - Digital Input Disable Register 1
        #[inline(always)]
        pub const fn didr1(&self) -> &DIDR1 {
            &self.didr1
        }
        ///0x02 - ADC Control and Status Register B
        #[inline(always)]
        pub const fn adcsrb(&self) -> &ADCSRB {
            &self.adcsrb
        }
        ///0x03 - ADC Data Register Bytes
        #[inline(always)]
        pub const fn adc(&self) -> &ADC {
            &self.adc
        }
        ///0x05 - ADC Control and Status Register A
        #[inline(always)]
        pub const fn adcsra(&self) -> &ADCSRA {
            &self.adcsra
        }
        ///0x06 - The ADC multiplexer Selection Register
        #[inline(always)]
        pub const fn admux(&self) -> &ADMUX {
            &self.admux
        }
    }
    /**ADC (rw) register accessor: ADC Data Register Bytes

You can [`read`](crate::Reg::read) this register and get [`adc::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`adc::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@adc`] module*/
    pub type ADC = crate::Reg<adc::ADC_SPEC>;
    ///ADC Data Register Bytes
    pub mod adc {
        ///Register `ADC` reader
        pub type R = crate::R<ADC_SPEC>;
        ///Register `ADC` writer
        pub type W = crate::W<ADC_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**ADC Data Register Bytes

You can [`read`](crate::Reg::read) this register and get [`adc::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`adc::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct ADC_SPEC;
        impl crate::RegisterSpec for ADC_SPEC {
            type Ux = u16;
        }
        ///`read()` method returns [`adc::R`](R) reader structure
        impl crate::Readable for ADC_SPEC {}
        ///`write(|w| ..)` method takes [`adc::W`](W) writer structure
        impl crate::Writable for ADC_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets ADC to value 0
        impl crate::Resettable for ADC_SPEC {}
    }
    /**ADCSRA (rw) register accessor: ADC Control and Status Register A

You can [`read`](crate::Reg::read) this register and get [`adcsra::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`adcsra::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@adcsra`] module*/
    pub type ADCSRA = crate::Reg<adcsra::ADCSRA_SPEC>;
    ///ADC Control and Status Register A
    pub mod adcsra {
        ///Register `ADCSRA` reader
        pub type R = crate::R<ADCSRA_SPEC>;
        ///Register `ADCSRA` writer
        pub type W = crate::W<ADCSRA_SPEC>;
        /**ADC Prescaler Select Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum ADPS_A {
            ///1: Prescaler Value 2
            PRESCALER_2 = 1,
            ///2: Prescaler Value 4
            PRESCALER_4 = 2,
            ///3: Prescaler Value 8
            PRESCALER_8 = 3,
            ///4: Prescaler Value 16
            PRESCALER_16 = 4,
            ///5: Prescaler Value 32
            PRESCALER_32 = 5,
            ///6: Prescaler Value 64
            PRESCALER_64 = 6,
            ///7: Prescaler Value 128
            PRESCALER_128 = 7,
        }
        impl From<ADPS_A> for u8 {
            #[inline(always)]
            fn from(variant: ADPS_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for ADPS_A {
            type Ux = u8;
        }
        impl crate::IsEnum for ADPS_A {}
        ///Field `ADPS` reader - ADC Prescaler Select Bits
        pub type ADPS_R = crate::FieldReader<ADPS_A>;
        impl ADPS_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> Option<ADPS_A> {
                match self.bits {
                    1 => Some(ADPS_A::PRESCALER_2),
                    2 => Some(ADPS_A::PRESCALER_4),
                    3 => Some(ADPS_A::PRESCALER_8),
                    4 => Some(ADPS_A::PRESCALER_16),
                    5 => Some(ADPS_A::PRESCALER_32),
                    6 => Some(ADPS_A::PRESCALER_64),
                    7 => Some(ADPS_A::PRESCALER_128),
                    _ => None,
                }
            }
            ///Prescaler Value 2
            #[inline(always)]
            pub fn is_prescaler_2(&self) -> bool {
                *self == ADPS_A::PRESCALER_2
            }
            ///Prescaler Value 4
            #[inline(always)]
            pub fn is_prescaler_4(&self) -> bool {
                *self == ADPS_A::PRESCALER_4
            }
            ///Prescaler Value 8
            #[inline(always)]
            pub fn is_prescaler_8(&self) -> bool {
                *self == ADPS_A::PRESCALER_8
            }
            ///Prescaler Value 16
            #[inline(always)]
            pub fn is_prescaler_16(&self) -> bool {
                *self == ADPS_A::PRESCALER_16
            }
            ///Prescaler Value 32
            #[inline(always)]
            pub fn is_prescaler_32(&self) -> bool {
                *self == ADPS_A::PRESCALER_32
            }
            ///Prescaler Value 64
            #[inline(always)]
            pub fn is_prescaler_64(&self) -> bool {
                *self == ADPS_A::PRESCALER_64
            }
            ///Prescaler Value 128
            #[inline(always)]
            pub fn is_prescaler_128(&self) -> bool {
                *self == ADPS_A::PRESCALER_128
            }
        }
        ///Field `ADPS` writer - ADC Prescaler Select Bits
        pub type ADPS_W<'a, REG> = crate::FieldWriter<'a, REG, 3, ADPS_A>;
        impl<'a, REG> ADPS_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Prescaler Value 2
            #[inline(always)]
            pub fn prescaler_2(self) -> &'a mut crate::W<REG> {
                self.variant(ADPS_A::PRESCALER_2)
            }
            ///Prescaler Value 4
            #[inline(always)]
            pub fn prescaler_4(self) -> &'a mut crate::W<REG> {
                self.variant(ADPS_A::PRESCALER_4)
            }
            ///Prescaler Value 8
            #[inline(always)]
            pub fn prescaler_8(self) -> &'a mut crate::W<REG> {
                self.variant(ADPS_A::PRESCALER_8)
            }
            ///Prescaler Value 16
            #[inline(always)]
            pub fn prescaler_16(self) -> &'a mut crate::W<REG> {
                self.variant(ADPS_A::PRESCALER_16)
            }
            ///Prescaler Value 32
            #[inline(always)]
            pub fn prescaler_32(self) -> &'a mut crate::W<REG> {
                self.variant(ADPS_A::PRESCALER_32)
            }
            ///Prescaler Value 64
            #[inline(always)]
            pub fn prescaler_64(self) -> &'a mut crate::W<REG> {
                self.variant(ADPS_A::PRESCALER_64)
            }
            ///Prescaler Value 128
            #[inline(always)]
            pub fn prescaler_128(self) -> &'a mut crate::W<REG> {
                self.variant(ADPS_A::PRESCALER_128)
            }
        }
        ///Field `ADIE` reader - ADC Interrupt Enable
        pub type ADIE_R = crate::BitReader;
        ///Field `ADIE` writer - ADC Interrupt Enable
        pub type ADIE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADIF` reader - ADC Interrupt Flag
        pub type ADIF_R = crate::BitReader;
        ///Field `ADIF` writer - ADC Interrupt Flag
        pub type ADIF_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADATE` reader - ADC Auto Trigger Enable
        pub type ADATE_R = crate::BitReader;
        ///Field `ADATE` writer - ADC Auto Trigger Enable
        pub type ADATE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADSC` reader - ADC Start Conversion
        pub type ADSC_R = crate::BitReader;
        ///Field `ADSC` writer - ADC Start Conversion
        pub type ADSC_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADEN` reader - ADC Enable
        pub type ADEN_R = crate::BitReader;
        ///Field `ADEN` writer - ADC Enable
        pub type ADEN_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:2 - ADC Prescaler Select Bits
            #[inline(always)]
            pub fn adps(&self) -> ADPS_R {
                ADPS_R::new(self.bits & 7)
            }
            ///Bit 3 - ADC Interrupt Enable
            #[inline(always)]
            pub fn adie(&self) -> ADIE_R {
                ADIE_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - ADC Interrupt Flag
            #[inline(always)]
            pub fn adif(&self) -> ADIF_R {
                ADIF_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - ADC Auto Trigger Enable
            #[inline(always)]
            pub fn adate(&self) -> ADATE_R {
                ADATE_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - ADC Start Conversion
            #[inline(always)]
            pub fn adsc(&self) -> ADSC_R {
                ADSC_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - ADC Enable
            #[inline(always)]
            pub fn aden(&self) -> ADEN_R {
                ADEN_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:2 - ADC Prescaler Select Bits
            #[inline(always)]
            pub fn adps(&mut self) -> ADPS_W<'_, ADCSRA_SPEC> {
                ADPS_W::new(self, 0)
            }
            ///Bit 3 - ADC Interrupt Enable
            #[inline(always)]
            pub fn adie(&mut self) -> ADIE_W<'_, ADCSRA_SPEC> {
                ADIE_W::new(self, 3)
            }
            ///Bit 4 - ADC Interrupt Flag
            #[inline(always)]
            pub fn adif(&mut self) -> ADIF_W<'_, ADCSRA_SPEC> {
                ADIF_W::new(self, 4)
            }
            ///Bit 5 - ADC Auto Trigger Enable
            #[inline(always)]
            pub fn adate(&mut self) -> ADATE_W<'_, ADCSRA_SPEC> {
                ADATE_W::new(self, 5)
            }
            ///Bit 6 - ADC Start Conversion
            #[inline(always)]
            pub fn adsc(&mut self) -> ADSC_W<'_, ADCSRA_SPEC> {
                ADSC_W::new(self, 6)
            }
            ///Bit 7 - ADC Enable
            #[inline(always)]
            pub fn aden(&mut self) -> ADEN_W<'_, ADCSRA_SPEC> {
                ADEN_W::new(self, 7)
            }
        }
        /**ADC Control and Status Register A

You can [`read`](crate::Reg::read) this register and get [`adcsra::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`adcsra::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct ADCSRA_SPEC;
        impl crate::RegisterSpec for ADCSRA_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`adcsra::R`](R) reader structure
        impl crate::Readable for ADCSRA_SPEC {}
        ///`write(|w| ..)` method takes [`adcsra::W`](W) writer structure
        impl crate::Writable for ADCSRA_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets ADCSRA to value 0
        impl crate::Resettable for ADCSRA_SPEC {}
    }
    /**ADCSRB (rw) register accessor: ADC Control and Status Register B

You can [`read`](crate::Reg::read) this register and get [`adcsrb::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`adcsrb::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@adcsrb`] module*/
    pub type ADCSRB = crate::Reg<adcsrb::ADCSRB_SPEC>;
    ///ADC Control and Status Register B
    pub mod adcsrb {
        ///Register `ADCSRB` reader
        pub type R = crate::R<ADCSRB_SPEC>;
        ///Register `ADCSRB` writer
        pub type W = crate::W<ADCSRB_SPEC>;
        /**ADC Auto Trigger Sources

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum ADTS_A {
            ///0: Free Running mode
            FREE_RUNNING_MODE = 0,
            ///1: Analog Comparator
            ANALOG_COMPARATOR = 1,
            ///2: External Interrupt Request 0
            EXTERNAL_INTERRUPT_REQUEST_0 = 2,
            ///3: Timer/Counter0 Compare Match A
            TIMER_COUNTER0_COMPARE_MATCH_A = 3,
            ///4: Timer/Counter0 Overflow
            TIMER_COUNTER0_OVERFLOW = 4,
            ///5: Timer/Counter1 Compare Match B
            TIMER_COUNTER1_COMPARE_MATCH_B = 5,
            ///6: Timer/Counter1 Overflow
            TIMER_COUNTER1_OVERFLOW = 6,
            ///7: Watchdog Interrupt Request
            WATCHDOG_INTERRUPT_REQUEST = 7,
        }
        impl From<ADTS_A> for u8 {
            #[inline(always)]
            fn from(variant: ADTS_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for ADTS_A {
            type Ux = u8;
        }
        impl crate::IsEnum for ADTS_A {}
        ///Field `ADTS` reader - ADC Auto Trigger Sources
        pub type ADTS_R = crate::FieldReader<ADTS_A>;
        impl ADTS_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> ADTS_A {
                match self.bits {
                    0 => ADTS_A::FREE_RUNNING_MODE,
                    1 => ADTS_A::ANALOG_COMPARATOR,
                    2 => ADTS_A::EXTERNAL_INTERRUPT_REQUEST_0,
                    3 => ADTS_A::TIMER_COUNTER0_COMPARE_MATCH_A,
                    4 => ADTS_A::TIMER_COUNTER0_OVERFLOW,
                    5 => ADTS_A::TIMER_COUNTER1_COMPARE_MATCH_B,
                    6 => ADTS_A::TIMER_COUNTER1_OVERFLOW,
                    7 => ADTS_A::WATCHDOG_INTERRUPT_REQUEST,
                    _ => unreachable!(),
                }
            }
            ///Free Running mode
            #[inline(always)]
            pub fn is_free_running_mode(&self) -> bool {
                *self == ADTS_A::FREE_RUNNING_MODE
            }
            ///Analog Comparator
            #[inline(always)]
            pub fn is_analog_comparator(&self) -> bool {
                *self == ADTS_A::ANALOG_COMPARATOR
            }
            ///External Interrupt Request 0
            #[inline(always)]
            pub fn is_external_interrupt_request_0(&self) -> bool {
                *self == ADTS_A::EXTERNAL_INTERRUPT_REQUEST_0
            }
            ///Timer/Counter0 Compare Match A
            #[inline(always)]
            pub fn is_timer_counter0_compare_match_a(&self) -> bool {
                *self == ADTS_A::TIMER_COUNTER0_COMPARE_MATCH_A
            }
            ///Timer/Counter0 Overflow
            #[inline(always)]
            pub fn is_timer_counter0_overflow(&self) -> bool {
                *self == ADTS_A::TIMER_COUNTER0_OVERFLOW
            }
            ///Timer/Counter1 Compare Match B
            #[inline(always)]
            pub fn is_timer_counter1_compare_match_b(&self) -> bool {
                *self == ADTS_A::TIMER_COUNTER1_COMPARE_MATCH_B
            }
            ///Timer/Counter1 Overflow
            #[inline(always)]
            pub fn is_timer_counter1_overflow(&self) -> bool {
                *self == ADTS_A::TIMER_COUNTER1_OVERFLOW
            }
            ///Watchdog Interrupt Request
            #[inline(always)]
            pub fn is_watchdog_interrupt_request(&self) -> bool {
                *self == ADTS_A::WATCHDOG_INTERRUPT_REQUEST
            }
        }
        ///Field `ADTS` writer - ADC Auto Trigger Sources
        pub type ADTS_W<'a, REG> = crate::FieldWriter<'a, REG, 3, ADTS_A, crate::Safe>;
        impl<'a, REG> ADTS_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Free Running mode
            #[inline(always)]
            pub fn free_running_mode(self) -> &'a mut crate::W<REG> {
                self.variant(ADTS_A::FREE_RUNNING_MODE)
            }
            ///Analog Comparator
            #[inline(always)]
            pub fn analog_comparator(self) -> &'a mut crate::W<REG> {
                self.variant(ADTS_A::ANALOG_COMPARATOR)
            }
            ///External Interrupt Request 0
            #[inline(always)]
            pub fn external_interrupt_request_0(self) -> &'a mut crate::W<REG> {
                self.variant(ADTS_A::EXTERNAL_INTERRUPT_REQUEST_0)
            }
            ///Timer/Counter0 Compare Match A
            #[inline(always)]
            pub fn timer_counter0_compare_match_a(self) -> &'a mut crate::W<REG> {
                self.variant(ADTS_A::TIMER_COUNTER0_COMPARE_MATCH_A)
            }
            ///Timer/Counter0 Overflow
            #[inline(always)]
            pub fn timer_counter0_overflow(self) -> &'a mut crate::W<REG> {
                self.variant(ADTS_A::TIMER_COUNTER0_OVERFLOW)
            }
            ///Timer/Counter1 Compare Match B
            #[inline(always)]
            pub fn timer_counter1_compare_match_b(self) -> &'a mut crate::W<REG> {
                self.variant(ADTS_A::TIMER_COUNTER1_COMPARE_MATCH_B)
            }
            ///Timer/Counter1 Overflow
            #[inline(always)]
            pub fn timer_counter1_overflow(self) -> &'a mut crate::W<REG> {
                self.variant(ADTS_A::TIMER_COUNTER1_OVERFLOW)
            }
            ///Watchdog Interrupt Request
            #[inline(always)]
            pub fn watchdog_interrupt_request(self) -> &'a mut crate::W<REG> {
                self.variant(ADTS_A::WATCHDOG_INTERRUPT_REQUEST)
            }
        }
        ///Field `MUX5` reader - No Description.
        pub type MUX5_R = crate::BitReader;
        ///Field `MUX5` writer - No Description.
        pub type MUX5_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `REFS2` reader - No Description.
        pub type REFS2_R = crate::BitReader;
        ///Field `REFS2` writer - No Description.
        pub type REFS2_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `IPR` reader - Input Polarity Mode
        pub type IPR_R = crate::BitReader;
        ///Field `IPR` writer - Input Polarity Mode
        pub type IPR_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `GSEL` reader - Gain Select
        pub type GSEL_R = crate::BitReader;
        ///Field `GSEL` writer - Gain Select
        pub type GSEL_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `BIN` reader - Bipolar Input Mode
        pub type BIN_R = crate::BitReader;
        ///Field `BIN` writer - Bipolar Input Mode
        pub type BIN_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:2 - ADC Auto Trigger Sources
            #[inline(always)]
            pub fn adts(&self) -> ADTS_R {
                ADTS_R::new(self.bits & 7)
            }
            ///Bit 3 - No Description.
            #[inline(always)]
            pub fn mux5(&self) -> MUX5_R {
                MUX5_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - No Description.
            #[inline(always)]
            pub fn refs2(&self) -> REFS2_R {
                REFS2_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Input Polarity Mode
            #[inline(always)]
            pub fn ipr(&self) -> IPR_R {
                IPR_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Gain Select
            #[inline(always)]
            pub fn gsel(&self) -> GSEL_R {
                GSEL_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Bipolar Input Mode
            #[inline(always)]
            pub fn bin(&self) -> BIN_R {
                BIN_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:2 - ADC Auto Trigger Sources
            #[inline(always)]
            pub fn adts(&mut self) -> ADTS_W<'_, ADCSRB_SPEC> {
                ADTS_W::new(self, 0)
            }
            ///Bit 3 - No Description.
            #[inline(always)]
            pub fn mux5(&mut self) -> MUX5_W<'_, ADCSRB_SPEC> {
                MUX5_W::new(self, 3)
            }
            ///Bit 4 - No Description.
            #[inline(always)]
            pub fn refs2(&mut self) -> REFS2_W<'_, ADCSRB_SPEC> {
                REFS2_W::new(self, 4)
            }
            ///Bit 5 - Input Polarity Mode
            #[inline(always)]
            pub fn ipr(&mut self) -> IPR_W<'_, ADCSRB_SPEC> {
                IPR_W::new(self, 5)
            }
            ///Bit 6 - Gain Select
            #[inline(always)]
            pub fn gsel(&mut self) -> GSEL_W<'_, ADCSRB_SPEC> {
                GSEL_W::new(self, 6)
            }
            ///Bit 7 - Bipolar Input Mode
            #[inline(always)]
            pub fn bin(&mut self) -> BIN_W<'_, ADCSRB_SPEC> {
                BIN_W::new(self, 7)
            }
        }
        /**ADC Control and Status Register B

You can [`read`](crate::Reg::read) this register and get [`adcsrb::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`adcsrb::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct ADCSRB_SPEC;
        impl crate::RegisterSpec for ADCSRB_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`adcsrb::R`](R) reader structure
        impl crate::Readable for ADCSRB_SPEC {}
        ///`write(|w| ..)` method takes [`adcsrb::W`](W) writer structure
        impl crate::Writable for ADCSRB_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets ADCSRB to value 0
        impl crate::Resettable for ADCSRB_SPEC {}
    }
    /**ADMUX (rw) register accessor: The ADC multiplexer Selection Register

You can [`read`](crate::Reg::read) this register and get [`admux::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`admux::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@admux`] module*/
    pub type ADMUX = crate::Reg<admux::ADMUX_SPEC>;
    ///The ADC multiplexer Selection Register
    pub mod admux {
        ///Register `ADMUX` reader
        pub type R = crate::R<ADMUX_SPEC>;
        ///Register `ADMUX` writer
        pub type W = crate::W<ADMUX_SPEC>;
        /**Analog Channel and Gain Selection Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum MUX_A {
            ///0: Single-ended Input ADC0
            ADC0 = 0,
            ///1: Single-ended Input ADC1
            ADC1 = 1,
            ///2: Single-ended Input ADC2
            ADC2 = 2,
            ///3: Single-ended Input ADC3
            ADC3 = 3,
            ///4: Single-ended Input ADC4
            ADC4 = 4,
            ///5: Single-ended Input ADC5
            ADC5 = 5,
            ///6: Single-ended Input ADC6
            ADC6 = 6,
            ///7: Single-ended Input ADC7
            ADC7 = 7,
            ///8: Single-ended Input ADC8
            ADC8 = 8,
            ///9: Single-ended Input ADC9
            ADC9 = 9,
            ///10: Single-ended Input ADC10
            ADC10 = 10,
            ///11: Differential Inputs Positive ADC0 Negative ADC1 20x Gain
            ADC0_ADC1_20X = 11,
            ///12: Differential Inputs Positive ADC0 Negative ADC1 1x Gain
            ADC0_ADC1_1X = 12,
            ///13: Differential Inputs Positive ADC1 Negative ADC1 20x Gain (for offset compensation)
            ADC1_ADC1_20X = 13,
            ///14: Differential Inputs Positive ADC2 Negative ADC1 20x Gain
            ADC2_ADC1_20X = 14,
            ///15: Differential Inputs Positive ADC2 Negative ADC1 1x Gain
            ADC2_ADC1_1X = 15,
            ///16: Differential Inputs Positive ADC2 Negative ADC3 1x Gain
            ADC2_ADC3_1X = 16,
            ///17: Differential Inputs Positive ADC3 Negative ADC3 20x Gain (for offset compensation)
            ADC3_ADC3_20X = 17,
            ///18: Differential Inputs Positive ADC4 Negative ADC3 20x Gain
            ADC4_ADC3_20X = 18,
            ///19: Differential Inputs Positive ADC4 Negative ADC3 1x Gain
            ADC4_ADC3_1X = 19,
            ///20: Differential Inputs Positive ADC4 Negative ADC5 20x Gain
            ADC4_ADC5_20X = 20,
            ///21: Differential Inputs Positive ADC4 Negative ADC5 1x Gain
            ADC4_ADC5_1X = 21,
            ///22: Differential Inputs Positive ADC5 Negative ADC5 20x Gain (for offset compensation)
            ADC5_ADC5_20X = 22,
            ///23: Differential Inputs Positive ADC6 Negative ADC5 20x Gain
            ADC6_ADC5_20X = 23,
            ///24: Differential Inputs Positive ADC6 Negative ADC5 1x Gain
            ADC6_ADC5_1X = 24,
            ///25: Differential Inputs Positive ADC8 Negative ADC9 20x Gain
            ADC8_ADC9_20X = 25,
            ///26: Differential Inputs Positive ADC8 Negative ADC9 1x Gain
            ADC8_ADC9_1X = 26,
            ///27: Differential Inputs Positive ADC9 Negative ADC9 20x Gain (for offset compensation)
            ADC9_ADC9_20X = 27,
            ///28: Differential Inputs Positive ADC10 Negative ADC9 20x Gain
            ADC10_ADC9_20X = 28,
            ///29: Differential Inputs Positive ADC10 Negative ADC9 1x Gain
            ADC10_ADC9_1X = 29,
            ///30: Internal 1.1V Reference
            ADC_VREF_1P1 = 30,
            ///31: 0V (GND)
            ADC_GND = 31,
        }
        impl From<MUX_A> for u8 {
            #[inline(always)]
            fn from(variant: MUX_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for MUX_A {
            type Ux = u8;
        }
        impl crate::IsEnum for MUX_A {}
        ///Field `MUX` reader - Analog Channel and Gain Selection Bits
        pub type MUX_R = crate::FieldReader<MUX_A>;
        impl MUX_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> MUX_A {
                match self.bits {
                    0 => MUX_A::ADC0,
                    1 => MUX_A::ADC1,
                    2 => MUX_A::ADC2,
                    3 => MUX_A::ADC3,
                    4 => MUX_A::ADC4,
                    5 => MUX_A::ADC5,
                    6 => MUX_A::ADC6,
                    7 => MUX_A::ADC7,
                    8 => MUX_A::ADC8,
                    9 => MUX_A::ADC9,
                    10 => MUX_A::ADC10,
                    11 => MUX_A::ADC0_ADC1_20X,
                    12 => MUX_A::ADC0_ADC1_1X,
                    13 => MUX_A::ADC1_ADC1_20X,
                    14 => MUX_A::ADC2_ADC1_20X,
                    15 => MUX_A::ADC2_ADC1_1X,
                    16 => MUX_A::ADC2_ADC3_1X,
                    17 => MUX_A::ADC3_ADC3_20X,
                    18 => MUX_A::ADC4_ADC3_20X,
                    19 => MUX_A::ADC4_ADC3_1X,
                    20 => MUX_A::ADC4_ADC5_20X,
                    21 => MUX_A::ADC4_ADC5_1X,
                    22 => MUX_A::ADC5_ADC5_20X,
                    23 => MUX_A::ADC6_ADC5_20X,
                    24 => MUX_A::ADC6_ADC5_1X,
                    25 => MUX_A::ADC8_ADC9_20X,
                    26 => MUX_A::ADC8_ADC9_1X,
                    27 => MUX_A::ADC9_ADC9_20X,
                    28 => MUX_A::ADC10_ADC9_20X,
                    29 => MUX_A::ADC10_ADC9_1X,
                    30 => MUX_A::ADC_VREF_1P1,
                    31 => MUX_A::ADC_GND,
                    _ => unreachable!(),
                }
            }
            ///Single-ended Input ADC0
            #[inline(always)]
            pub fn is_adc0(&self) -> bool {
                *self == MUX_A::ADC0
            }
            ///Single-ended Input ADC1
            #[inline(always)]
            pub fn is_adc1(&self) -> bool {
                *self == MUX_A::ADC1
            }
            ///Single-ended Input ADC2
            #[inline(always)]
            pub fn is_adc2(&self) -> bool {
                *self == MUX_A::ADC2
            }
            ///Single-ended Input ADC3
            #[inline(always)]
            pub fn is_adc3(&self) -> bool {
                *self == MUX_A::ADC3
            }
            ///Single-ended Input ADC4
            #[inline(always)]
            pub fn is_adc4(&self) -> bool {
                *self == MUX_A::ADC4
            }
            ///Single-ended Input ADC5
            #[inline(always)]
            pub fn is_adc5(&self) -> bool {
                *self == MUX_A::ADC5
            }
            ///Single-ended Input ADC6
            #[inline(always)]
            pub fn is_adc6(&self) -> bool {
                *self == MUX_A::ADC6
            }
            ///Single-ended Input ADC7
            #[inline(always)]
            pub fn is_adc7(&self) -> bool {
                *self == MUX_A::ADC7
            }
            ///Single-ended Input ADC8
            #[inline(always)]
            pub fn is_adc8(&self) -> bool {
                *self == MUX_A::ADC8
            }
            ///Single-ended Input ADC9
            #[inline(always)]
            pub fn is_adc9(&self) -> bool {
                *self == MUX_A::ADC9
            }
            ///Single-ended Input ADC10
            #[inline(always)]
            pub fn is_adc10(&self) -> bool {
                *self == MUX_A::ADC10
            }
            ///Differential Inputs Positive ADC0 Negative ADC1 20x Gain
            #[inline(always)]
            pub fn is_adc0_adc1_20x(&self) -> bool {
                *self == MUX_A::ADC0_ADC1_20X
            }
            ///Differential Inputs Positive ADC0 Negative ADC1 1x Gain
            #[inline(always)]
            pub fn is_adc0_adc1_1x(&self) -> bool {
                *self == MUX_A::ADC0_ADC1_1X
            }
            ///Differential Inputs Positive ADC1 Negative ADC1 20x Gain (for offset compensation)
            #[inline(always)]
            pub fn is_adc1_adc1_20x(&self) -> bool {
                *self == MUX_A::ADC1_ADC1_20X
            }
            ///Differential Inputs Positive ADC2 Negative ADC1 20x Gain
            #[inline(always)]
            pub fn is_adc2_adc1_20x(&self) -> bool {
                *self == MUX_A::ADC2_ADC1_20X
            }
            ///Differential Inputs Positive ADC2 Negative ADC1 1x Gain
            #[inline(always)]
            pub fn is_adc2_adc1_1x(&self) -> bool {
                *self == MUX_A::ADC2_ADC1_1X
            }
            ///Differential Inputs Positive ADC2 Negative ADC3 1x Gain
            #[inline(always)]
            pub fn is_adc2_adc3_1x(&self) -> bool {
                *self == MUX_A::ADC2_ADC3_1X
            }
            ///Differential Inputs Positive ADC3 Negative ADC3 20x Gain (for offset compensation)
            #[inline(always)]
            pub fn is_adc3_adc3_20x(&self) -> bool {
                *self == MUX_A::ADC3_ADC3_20X
            }
            ///Differential Inputs Positive ADC4 Negative ADC3 20x Gain
            #[inline(always)]
            pub fn is_adc4_adc3_20x(&self) -> bool {
                *self == MUX_A::ADC4_ADC3_20X
            }
            ///Differential Inputs Positive ADC4 Negative ADC3 1x Gain
            #[inline(always)]
            pub fn is_adc4_adc3_1x(&self) -> bool {
                *self == MUX_A::ADC4_ADC3_1X
            }
            ///Differential Inputs Positive ADC4 Negative ADC5 20x Gain
            #[inline(always)]
            pub fn is_adc4_adc5_20x(&self) -> bool {
                *self == MUX_A::ADC4_ADC5_20X
            }
            ///Differential Inputs Positive ADC4 Negative ADC5 1x Gain
            #[inline(always)]
            pub fn is_adc4_adc5_1x(&self) -> bool {
                *self == MUX_A::ADC4_ADC5_1X
            }
            ///Differential Inputs Positive ADC5 Negative ADC5 20x Gain (for offset compensation)
            #[inline(always)]
            pub fn is_adc5_adc5_20x(&self) -> bool {
                *self == MUX_A::ADC5_ADC5_20X
            }
            ///Differential Inputs Positive ADC6 Negative ADC5 20x Gain
            #[inline(always)]
            pub fn is_adc6_adc5_20x(&self) -> bool {
                *self == MUX_A::ADC6_ADC5_20X
            }
            ///Differential Inputs Positive ADC6 Negative ADC5 1x Gain
            #[inline(always)]
            pub fn is_adc6_adc5_1x(&self) -> bool {
                *self == MUX_A::ADC6_ADC5_1X
            }
            ///Differential Inputs Positive ADC8 Negative ADC9 20x Gain
            #[inline(always)]
            pub fn is_adc8_adc9_20x(&self) -> bool {
                *self == MUX_A::ADC8_ADC9_20X
            }
            ///Differential Inputs Positive ADC8 Negative ADC9 1x Gain
            #[inline(always)]
            pub fn is_adc8_adc9_1x(&self) -> bool {
                *self == MUX_A::ADC8_ADC9_1X
            }
            ///Differential Inputs Positive ADC9 Negative ADC9 20x Gain (for offset compensation)
            #[inline(always)]
            pub fn is_adc9_adc9_20x(&self) -> bool {
                *self == MUX_A::ADC9_ADC9_20X
            }
            ///Differential Inputs Positive ADC10 Negative ADC9 20x Gain
            #[inline(always)]
            pub fn is_adc10_adc9_20x(&self) -> bool {
                *self == MUX_A::ADC10_ADC9_20X
            }
            ///Differential Inputs Positive ADC10 Negative ADC9 1x Gain
            #[inline(always)]
            pub fn is_adc10_adc9_1x(&self) -> bool {
                *self == MUX_A::ADC10_ADC9_1X
            }
            ///Internal 1.1V Reference
            #[inline(always)]
            pub fn is_adc_vref_1p1(&self) -> bool {
                *self == MUX_A::ADC_VREF_1P1
            }
            ///0V (GND)
            #[inline(always)]
            pub fn is_adc_gnd(&self) -> bool {
                *self == MUX_A::ADC_GND
            }
        }
        ///Field `MUX` writer - Analog Channel and Gain Selection Bits
        pub type MUX_W<'a, REG> = crate::FieldWriter<'a, REG, 5, MUX_A, crate::Safe>;
        impl<'a, REG> MUX_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Single-ended Input ADC0
            #[inline(always)]
            pub fn adc0(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC0)
            }
            ///Single-ended Input ADC1
            #[inline(always)]
            pub fn adc1(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC1)
            }
            ///Single-ended Input ADC2
            #[inline(always)]
            pub fn adc2(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC2)
            }
            ///Single-ended Input ADC3
            #[inline(always)]
            pub fn adc3(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC3)
            }
            ///Single-ended Input ADC4
            #[inline(always)]
            pub fn adc4(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC4)
            }
            ///Single-ended Input ADC5
            #[inline(always)]
            pub fn adc5(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC5)
            }
            ///Single-ended Input ADC6
            #[inline(always)]
            pub fn adc6(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC6)
            }
            ///Single-ended Input ADC7
            #[inline(always)]
            pub fn adc7(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC7)
            }
            ///Single-ended Input ADC8
            #[inline(always)]
            pub fn adc8(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC8)
            }
            ///Single-ended Input ADC9
            #[inline(always)]
            pub fn adc9(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC9)
            }
            ///Single-ended Input ADC10
            #[inline(always)]
            pub fn adc10(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC10)
            }
            ///Differential Inputs Positive ADC0 Negative ADC1 20x Gain
            #[inline(always)]
            pub fn adc0_adc1_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC0_ADC1_20X)
            }
            ///Differential Inputs Positive ADC0 Negative ADC1 1x Gain
            #[inline(always)]
            pub fn adc0_adc1_1x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC0_ADC1_1X)
            }
            ///Differential Inputs Positive ADC1 Negative ADC1 20x Gain (for offset compensation)
            #[inline(always)]
            pub fn adc1_adc1_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC1_ADC1_20X)
            }
            ///Differential Inputs Positive ADC2 Negative ADC1 20x Gain
            #[inline(always)]
            pub fn adc2_adc1_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC2_ADC1_20X)
            }
            ///Differential Inputs Positive ADC2 Negative ADC1 1x Gain
            #[inline(always)]
            pub fn adc2_adc1_1x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC2_ADC1_1X)
            }
            ///Differential Inputs Positive ADC2 Negative ADC3 1x Gain
            #[inline(always)]
            pub fn adc2_adc3_1x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC2_ADC3_1X)
            }
            ///Differential Inputs Positive ADC3 Negative ADC3 20x Gain (for offset compensation)
            #[inline(always)]
            pub fn adc3_adc3_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC3_ADC3_20X)
            }
            ///Differential Inputs Positive ADC4 Negative ADC3 20x Gain
            #[inline(always)]
            pub fn adc4_adc3_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC4_ADC3_20X)
            }
            ///Differential Inputs Positive ADC4 Negative ADC3 1x Gain
            #[inline(always)]
            pub fn adc4_adc3_1x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC4_ADC3_1X)
            }
            ///Differential Inputs Positive ADC4 Negative ADC5 20x Gain
            #[inline(always)]
            pub fn adc4_adc5_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC4_ADC5_20X)
            }
            ///Differential Inputs Positive ADC4 Negative ADC5 1x Gain
            #[inline(always)]
            pub fn adc4_adc5_1x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC4_ADC5_1X)
            }
            ///Differential Inputs Positive ADC5 Negative ADC5 20x Gain (for offset compensation)
            #[inline(always)]
            pub fn adc5_adc5_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC5_ADC5_20X)
            }
            ///Differential Inputs Positive ADC6 Negative ADC5 20x Gain
            #[inline(always)]
            pub fn adc6_adc5_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC6_ADC5_20X)
            }
            ///Differential Inputs Positive ADC6 Negative ADC5 1x Gain
            #[inline(always)]
            pub fn adc6_adc5_1x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC6_ADC5_1X)
            }
            ///Differential Inputs Positive ADC8 Negative ADC9 20x Gain
            #[inline(always)]
            pub fn adc8_adc9_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC8_ADC9_20X)
            }
            ///Differential Inputs Positive ADC8 Negative ADC9 1x Gain
            #[inline(always)]
            pub fn adc8_adc9_1x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC8_ADC9_1X)
            }
            ///Differential Inputs Positive ADC9 Negative ADC9 20x Gain (for offset compensation)
            #[inline(always)]
            pub fn adc9_adc9_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC9_ADC9_20X)
            }
            ///Differential Inputs Positive ADC10 Negative ADC9 20x Gain
            #[inline(always)]
            pub fn adc10_adc9_20x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC10_ADC9_20X)
            }
            ///Differential Inputs Positive ADC10 Negative ADC9 1x Gain
            #[inline(always)]
            pub fn adc10_adc9_1x(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC10_ADC9_1X)
            }
            ///Internal 1.1V Reference
            #[inline(always)]
            pub fn adc_vref_1p1(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC_VREF_1P1)
            }
            ///0V (GND)
            #[inline(always)]
            pub fn adc_gnd(self) -> &'a mut crate::W<REG> {
                self.variant(MUX_A::ADC_GND)
            }
        }
        ///Field `ADLAR` reader - Left Adjust Result
        pub type ADLAR_R = crate::BitReader;
        ///Field `ADLAR` writer - Left Adjust Result
        pub type ADLAR_W<'a, REG> = crate::BitWriter<'a, REG>;
        /**Reference Selection Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum REFS_A {
            ///0: Vcc used as Voltage Reference, disconnected from Aref
            VCC = 0,
            ///1: External Voltage Reference at AREF pin, Internal Voltage Reference turned off
            AREF = 1,
            ///2: Internal 1.1V Voltage Reference
            INTERNAL = 2,
        }
        impl From<REFS_A> for u8 {
            #[inline(always)]
            fn from(variant: REFS_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for REFS_A {
            type Ux = u8;
        }
        impl crate::IsEnum for REFS_A {}
        ///Field `REFS` reader - Reference Selection Bits
        pub type REFS_R = crate::FieldReader<REFS_A>;
        impl REFS_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> Option<REFS_A> {
                match self.bits {
                    0 => Some(REFS_A::VCC),
                    1 => Some(REFS_A::AREF),
                    2 => Some(REFS_A::INTERNAL),
                    _ => None,
                }
            }
            ///Vcc used as Voltage Reference, disconnected from Aref
            #[inline(always)]
            pub fn is_vcc(&self) -> bool {
                *self == REFS_A::VCC
            }
            ///External Voltage Reference at AREF pin, Internal Voltage Reference turned off
            #[inline(always)]
            pub fn is_aref(&self) -> bool {
                *self == REFS_A::AREF
            }
            ///Internal 1.1V Voltage Reference
            #[inline(always)]
            pub fn is_internal(&self) -> bool {
                *self == REFS_A::INTERNAL
            }
        }
        ///Field `REFS` writer - Reference Selection Bits
        pub type REFS_W<'a, REG> = crate::FieldWriter<'a, REG, 2, REFS_A>;
        impl<'a, REG> REFS_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Vcc used as Voltage Reference, disconnected from Aref
            #[inline(always)]
            pub fn vcc(self) -> &'a mut crate::W<REG> {
                self.variant(REFS_A::VCC)
            }
            ///External Voltage Reference at AREF pin, Internal Voltage Reference turned off
            #[inline(always)]
            pub fn aref(self) -> &'a mut crate::W<REG> {
                self.variant(REFS_A::AREF)
            }
            ///Internal 1.1V Voltage Reference
            #[inline(always)]
            pub fn internal(self) -> &'a mut crate::W<REG> {
                self.variant(REFS_A::INTERNAL)
            }
        }
        impl R {
            ///Bits 0:4 - Analog Channel and Gain Selection Bits
            #[inline(always)]
            pub fn mux(&self) -> MUX_R {
                MUX_R::new(self.bits & 0x1f)
            }
            ///Bit 5 - Left Adjust Result
            #[inline(always)]
            pub fn adlar(&self) -> ADLAR_R {
                ADLAR_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bits 6:7 - Reference Selection Bits
            #[inline(always)]
            pub fn refs(&self) -> REFS_R {
                REFS_R::new((self.bits >> 6) & 3)
            }
        }
        impl W {
            ///Bits 0:4 - Analog Channel and Gain Selection Bits
            #[inline(always)]
            pub fn mux(&mut self) -> MUX_W<'_, ADMUX_SPEC> {
                MUX_W::new(self, 0)
            }
            ///Bit 5 - Left Adjust Result
            #[inline(always)]
            pub fn adlar(&mut self) -> ADLAR_W<'_, ADMUX_SPEC> {
                ADLAR_W::new(self, 5)
            }
            ///Bits 6:7 - Reference Selection Bits
            #[inline(always)]
            pub fn refs(&mut self) -> REFS_W<'_, ADMUX_SPEC> {
                REFS_W::new(self, 6)
            }
        }
        /**The ADC multiplexer Selection Register

You can [`read`](crate::Reg::read) this register and get [`admux::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`admux::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct ADMUX_SPEC;
        impl crate::RegisterSpec for ADMUX_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`admux::R`](R) reader structure
        impl crate::Readable for ADMUX_SPEC {}
        ///`write(|w| ..)` method takes [`admux::W`](W) writer structure
        impl crate::Writable for ADMUX_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets ADMUX to value 0
        impl crate::Resettable for ADMUX_SPEC {}
    }
    /**DIDR0 (rw) register accessor: Digital Input Disable Register 0

You can [`read`](crate::Reg::read) this register and get [`didr0::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`didr0::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@didr0`] module*/
    pub type DIDR0 = crate::Reg<didr0::DIDR0_SPEC>;
    ///Digital Input Disable Register 0
    pub mod didr0 {
        ///Register `DIDR0` reader
        pub type R = crate::R<DIDR0_SPEC>;
        ///Register `DIDR0` writer
        pub type W = crate::W<DIDR0_SPEC>;
        ///Field `ADC0D` reader - ADC0 Digital input Disable
        pub type ADC0D_R = crate::BitReader;
        ///Field `ADC0D` writer - ADC0 Digital input Disable
        pub type ADC0D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC1D` reader - ADC1 Digital input Disable
        pub type ADC1D_R = crate::BitReader;
        ///Field `ADC1D` writer - ADC1 Digital input Disable
        pub type ADC1D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC2D` reader - ADC2 Digital input Disable
        pub type ADC2D_R = crate::BitReader;
        ///Field `ADC2D` writer - ADC2 Digital input Disable
        pub type ADC2D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `AREFD` reader - AREF Digital Input Disable
        pub type AREFD_R = crate::BitReader;
        ///Field `AREFD` writer - AREF Digital Input Disable
        pub type AREFD_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC3D` reader - ADC3 Digital input Disable
        pub type ADC3D_R = crate::BitReader;
        ///Field `ADC3D` writer - ADC3 Digital input Disable
        pub type ADC3D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC4D` reader - ADC4 Digital input Disable
        pub type ADC4D_R = crate::BitReader;
        ///Field `ADC4D` writer - ADC4 Digital input Disable
        pub type ADC4D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC5D` reader - ADC5 Digital input Disable
        pub type ADC5D_R = crate::BitReader;
        ///Field `ADC5D` writer - ADC5 Digital input Disable
        pub type ADC5D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC6D` reader - ADC6 Digital input Disable
        pub type ADC6D_R = crate::BitReader;
        ///Field `ADC6D` writer - ADC6 Digital input Disable
        pub type ADC6D_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - ADC0 Digital input Disable
            #[inline(always)]
            pub fn adc0d(&self) -> ADC0D_R {
                ADC0D_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - ADC1 Digital input Disable
            #[inline(always)]
            pub fn adc1d(&self) -> ADC1D_R {
                ADC1D_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - ADC2 Digital input Disable
            #[inline(always)]
            pub fn adc2d(&self) -> ADC2D_R {
                ADC2D_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - AREF Digital Input Disable
            #[inline(always)]
            pub fn arefd(&self) -> AREFD_R {
                AREFD_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - ADC3 Digital input Disable
            #[inline(always)]
            pub fn adc3d(&self) -> ADC3D_R {
                ADC3D_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - ADC4 Digital input Disable
            #[inline(always)]
            pub fn adc4d(&self) -> ADC4D_R {
                ADC4D_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - ADC5 Digital input Disable
            #[inline(always)]
            pub fn adc5d(&self) -> ADC5D_R {
                ADC5D_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - ADC6 Digital input Disable
            #[inline(always)]
            pub fn adc6d(&self) -> ADC6D_R {
                ADC6D_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - ADC0 Digital input Disable
            #[inline(always)]
            pub fn adc0d(&mut self) -> ADC0D_W<'_, DIDR0_SPEC> {
                ADC0D_W::new(self, 0)
            }
            ///Bit 1 - ADC1 Digital input Disable
            #[inline(always)]
            pub fn adc1d(&mut self) -> ADC1D_W<'_, DIDR0_SPEC> {
                ADC1D_W::new(self, 1)
            }
            ///Bit 2 - ADC2 Digital input Disable
            #[inline(always)]
            pub fn adc2d(&mut self) -> ADC2D_W<'_, DIDR0_SPEC> {
                ADC2D_W::new(self, 2)
            }
            ///Bit 3 - AREF Digital Input Disable
            #[inline(always)]
            pub fn arefd(&mut self) -> AREFD_W<'_, DIDR0_SPEC> {
                AREFD_W::new(self, 3)
            }
            ///Bit 4 - ADC3 Digital input Disable
            #[inline(always)]
            pub fn adc3d(&mut self) -> ADC3D_W<'_, DIDR0_SPEC> {
                ADC3D_W::new(self, 4)
            }
            ///Bit 5 - ADC4 Digital input Disable
            #[inline(always)]
            pub fn adc4d(&mut self) -> ADC4D_W<'_, DIDR0_SPEC> {
                ADC4D_W::new(self, 5)
            }
            ///Bit 6 - ADC5 Digital input Disable
            #[inline(always)]
            pub fn adc5d(&mut self) -> ADC5D_W<'_, DIDR0_SPEC> {
                ADC5D_W::new(self, 6)
            }
            ///Bit 7 - ADC6 Digital input Disable
            #[inline(always)]
            pub fn adc6d(&mut self) -> ADC6D_W<'_, DIDR0_SPEC> {
                ADC6D_W::new(self, 7)
            }
        }
        /**Digital Input Disable Register 0

You can [`read`](crate::Reg::read) this register and get [`didr0::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`didr0::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct DIDR0_SPEC;
        impl crate::RegisterSpec for DIDR0_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`didr0::R`](R) reader structure
        impl crate::Readable for DIDR0_SPEC {}
        ///`write(|w| ..)` method takes [`didr0::W`](W) writer structure
        impl crate::Writable for DIDR0_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets DIDR0 to value 0
        impl crate::Resettable for DIDR0_SPEC {}
    }
    /**DIDR1 (rw) register accessor: Digital Input Disable Register 1

You can [`read`](crate::Reg::read) this register and get [`didr1::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`didr1::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@didr1`] module*/
    pub type DIDR1 = crate::Reg<didr1::DIDR1_SPEC>;
    ///Digital Input Disable Register 1
    pub mod didr1 {
        ///Register `DIDR1` reader
        pub type R = crate::R<DIDR1_SPEC>;
        ///Register `DIDR1` writer
        pub type W = crate::W<DIDR1_SPEC>;
        ///Field `ADC7D` reader - ADC7 Digital input Disable
        pub type ADC7D_R = crate::BitReader;
        ///Field `ADC7D` writer - ADC7 Digital input Disable
        pub type ADC7D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC8D` reader - ADC8 Digital input Disable
        pub type ADC8D_R = crate::BitReader;
        ///Field `ADC8D` writer - ADC8 Digital input Disable
        pub type ADC8D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC9D` reader - ADC9 Digital input Disable
        pub type ADC9D_R = crate::BitReader;
        ///Field `ADC9D` writer - ADC9 Digital input Disable
        pub type ADC9D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ADC10D` reader - ADC10 Digital input Disable
        pub type ADC10D_R = crate::BitReader;
        ///Field `ADC10D` writer - ADC10 Digital input Disable
        pub type ADC10D_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 4 - ADC7 Digital input Disable
            #[inline(always)]
            pub fn adc7d(&self) -> ADC7D_R {
                ADC7D_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - ADC8 Digital input Disable
            #[inline(always)]
            pub fn adc8d(&self) -> ADC8D_R {
                ADC8D_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - ADC9 Digital input Disable
            #[inline(always)]
            pub fn adc9d(&self) -> ADC9D_R {
                ADC9D_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - ADC10 Digital input Disable
            #[inline(always)]
            pub fn adc10d(&self) -> ADC10D_R {
                ADC10D_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 4 - ADC7 Digital input Disable
            #[inline(always)]
            pub fn adc7d(&mut self) -> ADC7D_W<'_, DIDR1_SPEC> {
                ADC7D_W::new(self, 4)
            }
            ///Bit 5 - ADC8 Digital input Disable
            #[inline(always)]
            pub fn adc8d(&mut self) -> ADC8D_W<'_, DIDR1_SPEC> {
                ADC8D_W::new(self, 5)
            }
            ///Bit 6 - ADC9 Digital input Disable
            #[inline(always)]
            pub fn adc9d(&mut self) -> ADC9D_W<'_, DIDR1_SPEC> {
                ADC9D_W::new(self, 6)
            }
            ///Bit 7 - ADC10 Digital input Disable
            #[inline(always)]
            pub fn adc10d(&mut self) -> ADC10D_W<'_, DIDR1_SPEC> {
                ADC10D_W::new(self, 7)
            }
        }
        /**Digital Input Disable Register 1

You can [`read`](crate::Reg::read) this register and get [`didr1::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`didr1::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct DIDR1_SPEC;
        impl crate::RegisterSpec for DIDR1_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`didr1::R`](R) reader structure
        impl crate::Readable for DIDR1_SPEC {}
        ///`write(|w| ..)` method takes [`didr1::W`](W) writer structure
        impl crate::Writable for DIDR1_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets DIDR1 to value 0
        impl crate::Resettable for DIDR1_SPEC {}
    }
}
///Bootloader
pub type BOOT_LOAD = crate::Periph<boot_load::RegisterBlock, 0x57>;
impl core::fmt::Debug for BOOT_LOAD {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("BOOT_LOAD").finish()
    }
}
///Bootloader
pub mod boot_load {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        spmcsr: SPMCSR,
    }
    impl RegisterBlock {
        ///0x00 - Store Program Memory Control Register
        #[inline(always)]
        pub const fn spmcsr(&self) -> &SPMCSR {
            &self.spmcsr
        }
    }
    /**SPMCSR (rw) register accessor: Store Program Memory Control Register

You can [`read`](crate::Reg::read) this register and get [`spmcsr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`spmcsr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@spmcsr`] module*/
    pub type SPMCSR = crate::Reg<spmcsr::SPMCSR_SPEC>;
    ///Store Program Memory Control Register
    pub mod spmcsr {
        ///Register `SPMCSR` reader
        pub type R = crate::R<SPMCSR_SPEC>;
        ///Register `SPMCSR` writer
        pub type W = crate::W<SPMCSR_SPEC>;
        ///Field `SPMEN` reader - Store Program Memory Enable
        pub type SPMEN_R = crate::BitReader;
        ///Field `SPMEN` writer - Store Program Memory Enable
        pub type SPMEN_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PGERS` reader - Page Erase
        pub type PGERS_R = crate::BitReader;
        ///Field `PGERS` writer - Page Erase
        pub type PGERS_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PGWRT` reader - Page Write
        pub type PGWRT_R = crate::BitReader;
        ///Field `PGWRT` writer - Page Write
        pub type PGWRT_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `RFLB` reader - Read fuse and lock bits
        pub type RFLB_R = crate::BitReader;
        ///Field `RFLB` writer - Read fuse and lock bits
        pub type RFLB_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `CTPB` reader - Clear temporary page buffer
        pub type CTPB_R = crate::BitReader;
        ///Field `CTPB` writer - Clear temporary page buffer
        pub type CTPB_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Store Program Memory Enable
            #[inline(always)]
            pub fn spmen(&self) -> SPMEN_R {
                SPMEN_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Page Erase
            #[inline(always)]
            pub fn pgers(&self) -> PGERS_R {
                PGERS_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Page Write
            #[inline(always)]
            pub fn pgwrt(&self) -> PGWRT_R {
                PGWRT_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Read fuse and lock bits
            #[inline(always)]
            pub fn rflb(&self) -> RFLB_R {
                RFLB_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Clear temporary page buffer
            #[inline(always)]
            pub fn ctpb(&self) -> CTPB_R {
                CTPB_R::new(((self.bits >> 4) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Store Program Memory Enable
            #[inline(always)]
            pub fn spmen(&mut self) -> SPMEN_W<'_, SPMCSR_SPEC> {
                SPMEN_W::new(self, 0)
            }
            ///Bit 1 - Page Erase
            #[inline(always)]
            pub fn pgers(&mut self) -> PGERS_W<'_, SPMCSR_SPEC> {
                PGERS_W::new(self, 1)
            }
            ///Bit 2 - Page Write
            #[inline(always)]
            pub fn pgwrt(&mut self) -> PGWRT_W<'_, SPMCSR_SPEC> {
                PGWRT_W::new(self, 2)
            }
            ///Bit 3 - Read fuse and lock bits
            #[inline(always)]
            pub fn rflb(&mut self) -> RFLB_W<'_, SPMCSR_SPEC> {
                RFLB_W::new(self, 3)
            }
            ///Bit 4 - Clear temporary page buffer
            #[inline(always)]
            pub fn ctpb(&mut self) -> CTPB_W<'_, SPMCSR_SPEC> {
                CTPB_W::new(self, 4)
            }
        }
        /**Store Program Memory Control Register

You can [`read`](crate::Reg::read) this register and get [`spmcsr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`spmcsr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct SPMCSR_SPEC;
        impl crate::RegisterSpec for SPMCSR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`spmcsr::R`](R) reader structure
        impl crate::Readable for SPMCSR_SPEC {}
        ///`write(|w| ..)` method takes [`spmcsr::W`](W) writer structure
        impl crate::Writable for SPMCSR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets SPMCSR to value 0
        impl crate::Resettable for SPMCSR_SPEC {}
    }
}
///CPU Registers
pub type CPU = crate::Periph<cpu::RegisterBlock, 0x2a>;
impl core::fmt::Debug for CPU {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("CPU").finish()
    }
}
///CPU Registers
pub mod cpu {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        gpior0: GPIOR0,
        gpior1: GPIOR1,
        gpior2: GPIOR2,
        _reserved3: [u8; 0x13],
        dwdr: DWDR,
        _reserved4: [u8; 0x07],
        clkpr: CLKPR,
        pllcsr: PLLCSR,
        _reserved6: [u8; 0x07],
        osccal: OSCCAL,
        _reserved7: [u8; 0x02],
        mcusr: MCUSR,
        mcucr: MCUCR,
        prr: PRR,
    }
    impl RegisterBlock {
        ///0x00 - General purpose register 0
        #[inline(always)]
        pub const fn gpior0(&self) -> &GPIOR0 {
            &self.gpior0
        }
        ///0x01 - General Purpose register 1
        #[inline(always)]
        pub const fn gpior1(&self) -> &GPIOR1 {
            &self.gpior1
        }
        ///0x02 - General Purpose IO register 2
        #[inline(always)]
        pub const fn gpior2(&self) -> &GPIOR2 {
            &self.gpior2
        }
        ///0x16 - debugWire data register
        #[inline(always)]
        pub const fn dwdr(&self) -> &DWDR {
            &self.dwdr
        }
        ///0x1e - Clock Prescale Register
        #[inline(always)]
        pub const fn clkpr(&self) -> &CLKPR {
            &self.clkpr
        }
        ///0x1f - PLL Control and status register
        #[inline(always)]
        pub const fn pllcsr(&self) -> &PLLCSR {
            &self.pllcsr
        }
        ///0x27 - Oscillator Calibration Register
        #[inline(always)]
        pub const fn osccal(&self) -> &OSCCAL {
            &self.osccal
        }
        ///0x2a - MCU Status register
        #[inline(always)]
        pub const fn mcusr(&self) -> &MCUSR {
            &self.mcusr
        }
        ///0x2b - MCU Control Register
        #[inline(always)]
        pub const fn mcucr(&self) -> &MCUCR {
            &self.mcucr
        }
        ///0x2c - Power Reduction Register
        #[inline(always)]
        pub const fn prr(&self) -> &PRR {
            &self.prr
        }
    }
    /**CLKPR (rw) register accessor: Clock Prescale Register

You can [`read`](crate::Reg::read) this register and get [`clkpr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`clkpr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@clkpr`] module*/
    pub type CLKPR = crate::Reg<clkpr::CLKPR_SPEC>;
    ///Clock Prescale Register
    pub mod clkpr {
        ///Register `CLKPR` reader
        pub type R = crate::R<CLKPR_SPEC>;
        ///Register `CLKPR` writer
        pub type W = crate::W<CLKPR_SPEC>;
        /**Clock Prescaler Select Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum CLKPS_A {
            ///0: 1
            _1 = 0,
            ///1: 2
            _2 = 1,
            ///2: 4
            _4 = 2,
            ///3: 8
            _8 = 3,
            ///4: 16
            _16 = 4,
            ///5: 32
            _32 = 5,
            ///6: 64
            _64 = 6,
            ///7: 128
            _128 = 7,
            ///8: 256
            _256 = 8,
        }
        impl From<CLKPS_A> for u8 {
            #[inline(always)]
            fn from(variant: CLKPS_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for CLKPS_A {
            type Ux = u8;
        }
        impl crate::IsEnum for CLKPS_A {}
        ///Field `CLKPS` reader - Clock Prescaler Select Bits
        pub type CLKPS_R = crate::FieldReader<CLKPS_A>;
        impl CLKPS_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> Option<CLKPS_A> {
                match self.bits {
                    0 => Some(CLKPS_A::_1),
                    1 => Some(CLKPS_A::_2),
                    2 => Some(CLKPS_A::_4),
                    3 => Some(CLKPS_A::_8),
                    4 => Some(CLKPS_A::_16),
                    5 => Some(CLKPS_A::_32),
                    6 => Some(CLKPS_A::_64),
                    7 => Some(CLKPS_A::_128),
                    8 => Some(CLKPS_A::_256),
                    _ => None,
                }
            }
            ///1
            #[inline(always)]
            pub fn is_1(&self) -> bool {
                *self == CLKPS_A::_1
            }
            ///2
            #[inline(always)]
            pub fn is_2(&self) -> bool {
                *self == CLKPS_A::_2
            }
            ///4
            #[inline(always)]
            pub fn is_4(&self) -> bool {
                *self == CLKPS_A::_4
            }
            ///8
            #[inline(always)]
            pub fn is_8(&self) -> bool {
                *self == CLKPS_A::_8
            }
            ///16
            #[inline(always)]
            pub fn is_16(&self) -> bool {
                *self == CLKPS_A::_16
            }
            ///32
            #[inline(always)]
            pub fn is_32(&self) -> bool {
                *self == CLKPS_A::_32
            }
            ///64
            #[inline(always)]
            pub fn is_64(&self) -> bool {
                *self == CLKPS_A::_64
            }
            ///128
            #[inline(always)]
            pub fn is_128(&self) -> bool {
                *self == CLKPS_A::_128
            }
            ///256
            #[inline(always)]
            pub fn is_256(&self) -> bool {
                *self == CLKPS_A::_256
            }
        }
        ///Field `CLKPS` writer - Clock Prescaler Select Bits
        pub type CLKPS_W<'a, REG> = crate::FieldWriter<'a, REG, 4, CLKPS_A>;
        impl<'a, REG> CLKPS_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///1
            #[inline(always)]
            pub fn _1(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_1)
            }
            ///2
            #[inline(always)]
            pub fn _2(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_2)
            }
            ///4
            #[inline(always)]
            pub fn _4(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_4)
            }
            ///8
            #[inline(always)]
            pub fn _8(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_8)
            }
            ///16
            #[inline(always)]
            pub fn _16(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_16)
            }
            ///32
            #[inline(always)]
            pub fn _32(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_32)
            }
            ///64
            #[inline(always)]
            pub fn _64(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_64)
            }
            ///128
            #[inline(always)]
            pub fn _128(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_128)
            }
            ///256
            #[inline(always)]
            pub fn _256(self) -> &'a mut crate::W<REG> {
                self.variant(CLKPS_A::_256)
            }
        }
        ///Field `CLKPCE` reader - Clock Prescaler Change Enable
        pub type CLKPCE_R = crate::BitReader;
        ///Field `CLKPCE` writer - Clock Prescaler Change Enable
        pub type CLKPCE_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:3 - Clock Prescaler Select Bits
            #[inline(always)]
            pub fn clkps(&self) -> CLKPS_R {
                CLKPS_R::new(self.bits & 0x0f)
            }
            ///Bit 7 - Clock Prescaler Change Enable
            #[inline(always)]
            pub fn clkpce(&self) -> CLKPCE_R {
                CLKPCE_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:3 - Clock Prescaler Select Bits
            #[inline(always)]
            pub fn clkps(&mut self) -> CLKPS_W<'_, CLKPR_SPEC> {
                CLKPS_W::new(self, 0)
            }
            ///Bit 7 - Clock Prescaler Change Enable
            #[inline(always)]
            pub fn clkpce(&mut self) -> CLKPCE_W<'_, CLKPR_SPEC> {
                CLKPCE_W::new(self, 7)
            }
        }
        /**Clock Prescale Register

You can [`read`](crate::Reg::read) this register and get [`clkpr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`clkpr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct CLKPR_SPEC;
        impl crate::RegisterSpec for CLKPR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`clkpr::R`](R) reader structure
        impl crate::Readable for CLKPR_SPEC {}
        ///`write(|w| ..)` method takes [`clkpr::W`](W) writer structure
        impl crate::Writable for CLKPR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets CLKPR to value 0
        impl crate::Resettable for CLKPR_SPEC {}
    }
    /**DWDR (rw) register accessor: debugWire data register

You can [`read`](crate::Reg::read) this register and get [`dwdr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`dwdr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@dwdr`] module*/
    pub type DWDR = crate::Reg<dwdr::DWDR_SPEC>;
    ///debugWire data register
    pub mod dwdr {
        ///Register `DWDR` reader
        pub type R = crate::R<DWDR_SPEC>;
        ///Register `DWDR` writer
        pub type W = crate::W<DWDR_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**debugWire data register

You can [`read`](crate::Reg::read) this register and get [`dwdr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`dwdr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct DWDR_SPEC;
        impl crate::RegisterSpec for DWDR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`dwdr::R`](R) reader structure
        impl crate::Readable for DWDR_SPEC {}
        ///`write(|w| ..)` method takes [`dwdr::W`](W) writer structure
        impl crate::Writable for DWDR_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets DWDR to value 0
        impl crate::Resettable for DWDR_SPEC {}
    }
    /**GPIOR0 (rw) register accessor: General purpose register 0

You can [`read`](crate::Reg::read) this register and get [`gpior0::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gpior0::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@gpior0`] module*/
    pub type GPIOR0 = crate::Reg<gpior0::GPIOR0_SPEC>;
    ///General purpose register 0
    pub mod gpior0 {
        ///Register `GPIOR0` reader
        pub type R = crate::R<GPIOR0_SPEC>;
        ///Register `GPIOR0` writer
        pub type W = crate::W<GPIOR0_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**General purpose register 0

You can [`read`](crate::Reg::read) this register and get [`gpior0::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gpior0::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct GPIOR0_SPEC;
        impl crate::RegisterSpec for GPIOR0_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`gpior0::R`](R) reader structure
        impl crate::Readable for GPIOR0_SPEC {}
        ///`write(|w| ..)` method takes [`gpior0::W`](W) writer structure
        impl crate::Writable for GPIOR0_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets GPIOR0 to value 0
        impl crate::Resettable for GPIOR0_SPEC {}
    }
    /**GPIOR1 (rw) register accessor: General Purpose register 1

You can [`read`](crate::Reg::read) this register and get [`gpior1::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gpior1::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@gpior1`] module*/
    pub type GPIOR1 = crate::Reg<gpior1::GPIOR1_SPEC>;
    ///General Purpose register 1
    pub mod gpior1 {
        ///Register `GPIOR1` reader
        pub type R = crate::R<GPIOR1_SPEC>;
        ///Register `GPIOR1` writer
        pub type W = crate::W<GPIOR1_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**General Purpose register 1

You can [`read`](crate::Reg::read) this register and get [`gpior1::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gpior1::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct GPIOR1_SPEC;
        impl crate::RegisterSpec for GPIOR1_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`gpior1::R`](R) reader structure
        impl crate::Readable for GPIOR1_SPEC {}
        ///`write(|w| ..)` method takes [`gpior1::W`](W) writer structure
        impl crate::Writable for GPIOR1_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets GPIOR1 to value 0
        impl crate::Resettable for GPIOR1_SPEC {}
    }
    /**GPIOR2 (rw) register accessor: General Purpose IO register 2

You can [`read`](crate::Reg::read) this register and get [`gpior2::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gpior2::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@gpior2`] module*/
    pub type GPIOR2 = crate::Reg<gpior2::GPIOR2_SPEC>;
    ///General Purpose IO register 2
    pub mod gpior2 {
        ///Register `GPIOR2` reader
        pub type R = crate::R<GPIOR2_SPEC>;
        ///Register `GPIOR2` writer
        pub type W = crate::W<GPIOR2_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**General Purpose IO register 2

You can [`read`](crate::Reg::read) this register and get [`gpior2::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gpior2::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct GPIOR2_SPEC;
        impl crate::RegisterSpec for GPIOR2_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`gpior2::R`](R) reader structure
        impl crate::Readable for GPIOR2_SPEC {}
        ///`write(|w| ..)` method takes [`gpior2::W`](W) writer structure
        impl crate::Writable for GPIOR2_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets GPIOR2 to value 0
        impl crate::Resettable for GPIOR2_SPEC {}
    }
    /**MCUCR (rw) register accessor: MCU Control Register

You can [`read`](crate::Reg::read) this register and get [`mcucr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`mcucr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@mcucr`] module*/
    pub type MCUCR = crate::Reg<mcucr::MCUCR_SPEC>;
    ///MCU Control Register
    pub mod mcucr {
        ///Register `MCUCR` reader
        pub type R = crate::R<MCUCR_SPEC>;
        ///Register `MCUCR` writer
        pub type W = crate::W<MCUCR_SPEC>;
        /**Interrupt Sense Control 0 bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum ISC0_A {
            ///0: Low Level of INTX
            LOW_LEVEL_OF_INTX = 0,
            ///1: Any Logical Change in INTX
            ANY_LOGICAL_CHANGE_IN_INTX = 1,
            ///2: Falling Edge of INTX
            FALLING_EDGE_OF_INTX = 2,
            ///3: Rising Edge of INTX
            RISING_EDGE_OF_INTX = 3,
        }
        impl From<ISC0_A> for u8 {
            #[inline(always)]
            fn from(variant: ISC0_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for ISC0_A {
            type Ux = u8;
        }
        impl crate::IsEnum for ISC0_A {}
        ///Field `ISC0` reader - Interrupt Sense Control 0 bits
        pub type ISC0_R = crate::FieldReader<ISC0_A>;
        impl ISC0_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> ISC0_A {
                match self.bits {
                    0 => ISC0_A::LOW_LEVEL_OF_INTX,
                    1 => ISC0_A::ANY_LOGICAL_CHANGE_IN_INTX,
                    2 => ISC0_A::FALLING_EDGE_OF_INTX,
                    3 => ISC0_A::RISING_EDGE_OF_INTX,
                    _ => unreachable!(),
                }
            }
            ///Low Level of INTX
            #[inline(always)]
            pub fn is_low_level_of_intx(&self) -> bool {
                *self == ISC0_A::LOW_LEVEL_OF_INTX
            }
            ///Any Logical Change in INTX
            #[inline(always)]
            pub fn is_any_logical_change_in_intx(&self) -> bool {
                *self == ISC0_A::ANY_LOGICAL_CHANGE_IN_INTX
            }
            ///Falling Edge of INTX
            #[inline(always)]
            pub fn is_falling_edge_of_intx(&self) -> bool {
                *self == ISC0_A::FALLING_EDGE_OF_INTX
            }
            ///Rising Edge of INTX
            #[inline(always)]
            pub fn is_rising_edge_of_intx(&self) -> bool {
                *self == ISC0_A::RISING_EDGE_OF_INTX
            }
        }
        ///Field `ISC0` writer - Interrupt Sense Control 0 bits
        pub type ISC0_W<'a, REG> = crate::FieldWriter<'a, REG, 2, ISC0_A, crate::Safe>;
        impl<'a, REG> ISC0_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Low Level of INTX
            #[inline(always)]
            pub fn low_level_of_intx(self) -> &'a mut crate::W<REG> {
                self.variant(ISC0_A::LOW_LEVEL_OF_INTX)
            }
            ///Any Logical Change in INTX
            #[inline(always)]
            pub fn any_logical_change_in_intx(self) -> &'a mut crate::W<REG> {
                self.variant(ISC0_A::ANY_LOGICAL_CHANGE_IN_INTX)
            }
            ///Falling Edge of INTX
            #[inline(always)]
            pub fn falling_edge_of_intx(self) -> &'a mut crate::W<REG> {
                self.variant(ISC0_A::FALLING_EDGE_OF_INTX)
            }
            ///Rising Edge of INTX
            #[inline(always)]
            pub fn rising_edge_of_intx(self) -> &'a mut crate::W<REG> {
                self.variant(ISC0_A::RISING_EDGE_OF_INTX)
            }
        }
        ///Field `BODSE` reader - BOD Sleep Enable
        pub type BODSE_R = crate::BitReader;
        ///Field `BODSE` writer - BOD Sleep Enable
        pub type BODSE_W<'a, REG> = crate::BitWriter<'a, REG>;
        /**Sleep Mode Select Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum SM_A {
            ///0: Idle
            IDLE = 0,
            ///1: ADC Noise Reduction (If Available)
            ADC = 1,
            ///2: Power Down
            PDOWN = 2,
            ///3: Standby
            STDBY = 3,
        }
        impl From<SM_A> for u8 {
            #[inline(always)]
            fn from(variant: SM_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for SM_A {
            type Ux = u8;
        }
        impl crate::IsEnum for SM_A {}
        ///Field `SM` reader - Sleep Mode Select Bits
        pub type SM_R = crate::FieldReader<SM_A>;
        impl SM_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> SM_A {
                match self.bits {
                    0 => SM_A::IDLE,
                    1 => SM_A::ADC,
                    2 => SM_A::PDOWN,
                    3 => SM_A::STDBY,
                    _ => unreachable!(),
                }
            }
            ///Idle
            #[inline(always)]
            pub fn is_idle(&self) -> bool {
                *self == SM_A::IDLE
            }
            ///ADC Noise Reduction (If Available)
            #[inline(always)]
            pub fn is_adc(&self) -> bool {
                *self == SM_A::ADC
            }
            ///Power Down
            #[inline(always)]
            pub fn is_pdown(&self) -> bool {
                *self == SM_A::PDOWN
            }
            ///Standby
            #[inline(always)]
            pub fn is_stdby(&self) -> bool {
                *self == SM_A::STDBY
            }
        }
        ///Field `SM` writer - Sleep Mode Select Bits
        pub type SM_W<'a, REG> = crate::FieldWriter<'a, REG, 2, SM_A, crate::Safe>;
        impl<'a, REG> SM_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Idle
            #[inline(always)]
            pub fn idle(self) -> &'a mut crate::W<REG> {
                self.variant(SM_A::IDLE)
            }
            ///ADC Noise Reduction (If Available)
            #[inline(always)]
            pub fn adc(self) -> &'a mut crate::W<REG> {
                self.variant(SM_A::ADC)
            }
            ///Power Down
            #[inline(always)]
            pub fn pdown(self) -> &'a mut crate::W<REG> {
                self.variant(SM_A::PDOWN)
            }
            ///Standby
            #[inline(always)]
            pub fn stdby(self) -> &'a mut crate::W<REG> {
                self.variant(SM_A::STDBY)
            }
        }
        ///Field `SE` reader - Sleep Enable
        pub type SE_R = crate::BitReader;
        ///Field `SE` writer - Sleep Enable
        pub type SE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PUD` reader - Pull-up Disable
        pub type PUD_R = crate::BitReader;
        ///Field `PUD` writer - Pull-up Disable
        pub type PUD_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `BODS` reader - BOD Sleep
        pub type BODS_R = crate::BitReader;
        ///Field `BODS` writer - BOD Sleep
        pub type BODS_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:1 - Interrupt Sense Control 0 bits
            #[inline(always)]
            pub fn isc0(&self) -> ISC0_R {
                ISC0_R::new(self.bits & 3)
            }
            ///Bit 2 - BOD Sleep Enable
            #[inline(always)]
            pub fn bodse(&self) -> BODSE_R {
                BODSE_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bits 3:4 - Sleep Mode Select Bits
            #[inline(always)]
            pub fn sm(&self) -> SM_R {
                SM_R::new((self.bits >> 3) & 3)
            }
            ///Bit 5 - Sleep Enable
            #[inline(always)]
            pub fn se(&self) -> SE_R {
                SE_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Pull-up Disable
            #[inline(always)]
            pub fn pud(&self) -> PUD_R {
                PUD_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - BOD Sleep
            #[inline(always)]
            pub fn bods(&self) -> BODS_R {
                BODS_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:1 - Interrupt Sense Control 0 bits
            #[inline(always)]
            pub fn isc0(&mut self) -> ISC0_W<'_, MCUCR_SPEC> {
                ISC0_W::new(self, 0)
            }
            ///Bit 2 - BOD Sleep Enable
            #[inline(always)]
            pub fn bodse(&mut self) -> BODSE_W<'_, MCUCR_SPEC> {
                BODSE_W::new(self, 2)
            }
            ///Bits 3:4 - Sleep Mode Select Bits
            #[inline(always)]
            pub fn sm(&mut self) -> SM_W<'_, MCUCR_SPEC> {
                SM_W::new(self, 3)
            }
            ///Bit 5 - Sleep Enable
            #[inline(always)]
            pub fn se(&mut self) -> SE_W<'_, MCUCR_SPEC> {
                SE_W::new(self, 5)
            }
            ///Bit 6 - Pull-up Disable
            #[inline(always)]
            pub fn pud(&mut self) -> PUD_W<'_, MCUCR_SPEC> {
                PUD_W::new(self, 6)
            }
            ///Bit 7 - BOD Sleep
            #[inline(always)]
            pub fn bods(&mut self) -> BODS_W<'_, MCUCR_SPEC> {
                BODS_W::new(self, 7)
            }
        }
        /**MCU Control Register

You can [`read`](crate::Reg::read) this register and get [`mcucr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`mcucr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct MCUCR_SPEC;
        impl crate::RegisterSpec for MCUCR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`mcucr::R`](R) reader structure
        impl crate::Readable for MCUCR_SPEC {}
        ///`write(|w| ..)` method takes [`mcucr::W`](W) writer structure
        impl crate::Writable for MCUCR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets MCUCR to value 0
        impl crate::Resettable for MCUCR_SPEC {}
    }
    /**MCUSR (rw) register accessor: MCU Status register

You can [`read`](crate::Reg::read) this register and get [`mcusr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`mcusr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@mcusr`] module*/
    pub type MCUSR = crate::Reg<mcusr::MCUSR_SPEC>;
    ///MCU Status register
    pub mod mcusr {
        ///Register `MCUSR` reader
        pub type R = crate::R<MCUSR_SPEC>;
        ///Register `MCUSR` writer
        pub type W = crate::W<MCUSR_SPEC>;
        ///Field `PORF` reader - Power-On Reset Flag
        pub type PORF_R = crate::BitReader;
        ///Field `PORF` writer - Power-On Reset Flag
        pub type PORF_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `EXTRF` reader - External Reset Flag
        pub type EXTRF_R = crate::BitReader;
        ///Field `EXTRF` writer - External Reset Flag
        pub type EXTRF_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `BORF` reader - Brown-out Reset Flag
        pub type BORF_R = crate::BitReader;
        ///Field `BORF` writer - Brown-out Reset Flag
        pub type BORF_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `WDRF` reader - Watchdog Reset Flag
        pub type WDRF_R = crate::BitReader;
        ///Field `WDRF` writer - Watchdog Reset Flag
        pub type WDRF_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Power-On Reset Flag
            #[inline(always)]
            pub fn porf(&self) -> PORF_R {
                PORF_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - External Reset Flag
            #[inline(always)]
            pub fn extrf(&self) -> EXTRF_R {
                EXTRF_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Brown-out Reset Flag
            #[inline(always)]
            pub fn borf(&self) -> BORF_R {
                BORF_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Watchdog Reset Flag
            #[inline(always)]
            pub fn wdrf(&self) -> WDRF_R {
                WDRF_R::new(((self.bits >> 3) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Power-On Reset Flag
            #[inline(always)]
            pub fn porf(&mut self) -> PORF_W<'_, MCUSR_SPEC> {
                PORF_W::new(self, 0)
            }
            ///Bit 1 - External Reset Flag
            #[inline(always)]
            pub fn extrf(&mut self) -> EXTRF_W<'_, MCUSR_SPEC> {
                EXTRF_W::new(self, 1)
            }
            ///Bit 2 - Brown-out Reset Flag
            #[inline(always)]
            pub fn borf(&mut self) -> BORF_W<'_, MCUSR_SPEC> {
                BORF_W::new(self, 2)
            }
            ///Bit 3 - Watchdog Reset Flag
            #[inline(always)]
            pub fn wdrf(&mut self) -> WDRF_W<'_, MCUSR_SPEC> {
                WDRF_W::new(self, 3)
            }
        }
        /**MCU Status register

You can [`read`](crate::Reg::read) this register and get [`mcusr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`mcusr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct MCUSR_SPEC;
        impl crate::RegisterSpec for MCUSR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`mcusr::R`](R) reader structure
        impl crate::Readable for MCUSR_SPEC {}
        ///`write(|w| ..)` method takes [`mcusr::W`](W) writer structure
        impl crate::Writable for MCUSR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets MCUSR to value 0
        impl crate::Resettable for MCUSR_SPEC {}
    }
    /**OSCCAL (rw) register accessor: Oscillator Calibration Register

You can [`read`](crate::Reg::read) this register and get [`osccal::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`osccal::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@osccal`] module*/
    pub type OSCCAL = crate::Reg<osccal::OSCCAL_SPEC>;
    ///Oscillator Calibration Register
    pub mod osccal {
        ///Register `OSCCAL` reader
        pub type R = crate::R<OSCCAL_SPEC>;
        ///Register `OSCCAL` writer
        pub type W = crate::W<OSCCAL_SPEC>;
        ///Field `OSCCAL` reader - Oscillator Calibration
        pub type OSCCAL_R = crate::FieldReader;
        ///Field `OSCCAL` writer - Oscillator Calibration
        pub type OSCCAL_W<'a, REG> = crate::FieldWriter<'a, REG, 8, u8, crate::Safe>;
        impl R {
            ///Bits 0:7 - Oscillator Calibration
            #[inline(always)]
            pub fn osccal(&self) -> OSCCAL_R {
                OSCCAL_R::new(self.bits)
            }
        }
        impl W {
            ///Bits 0:7 - Oscillator Calibration
            #[inline(always)]
            pub fn osccal(&mut self) -> OSCCAL_W<'_, OSCCAL_SPEC> {
                OSCCAL_W::new(self, 0)
            }
        }
        /**Oscillator Calibration Register

You can [`read`](crate::Reg::read) this register and get [`osccal::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`osccal::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct OSCCAL_SPEC;
        impl crate::RegisterSpec for OSCCAL_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`osccal::R`](R) reader structure
        impl crate::Readable for OSCCAL_SPEC {}
        ///`write(|w| ..)` method takes [`osccal::W`](W) writer structure
        impl crate::Writable for OSCCAL_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets OSCCAL to value 0
        impl crate::Resettable for OSCCAL_SPEC {}
    }
    /**PLLCSR (rw) register accessor: PLL Control and status register

You can [`read`](crate::Reg::read) this register and get [`pllcsr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pllcsr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@pllcsr`] module*/
    pub type PLLCSR = crate::Reg<pllcsr::PLLCSR_SPEC>;
    ///PLL Control and status register
    pub mod pllcsr {
        ///Register `PLLCSR` reader
        pub type R = crate::R<PLLCSR_SPEC>;
        ///Register `PLLCSR` writer
        pub type W = crate::W<PLLCSR_SPEC>;
        ///Field `PLOCK` reader - PLL Lock detector
        pub type PLOCK_R = crate::BitReader;
        ///Field `PLOCK` writer - PLL Lock detector
        pub type PLOCK_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PLLE` reader - PLL Enable
        pub type PLLE_R = crate::BitReader;
        ///Field `PLLE` writer - PLL Enable
        pub type PLLE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PCKE` reader - PCK Enable
        pub type PCKE_R = crate::BitReader;
        ///Field `PCKE` writer - PCK Enable
        pub type PCKE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `LSM` reader - Low speed mode
        pub type LSM_R = crate::BitReader;
        ///Field `LSM` writer - Low speed mode
        pub type LSM_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - PLL Lock detector
            #[inline(always)]
            pub fn plock(&self) -> PLOCK_R {
                PLOCK_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - PLL Enable
            #[inline(always)]
            pub fn plle(&self) -> PLLE_R {
                PLLE_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - PCK Enable
            #[inline(always)]
            pub fn pcke(&self) -> PCKE_R {
                PCKE_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 7 - Low speed mode
            #[inline(always)]
            pub fn lsm(&self) -> LSM_R {
                LSM_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - PLL Lock detector
            #[inline(always)]
            pub fn plock(&mut self) -> PLOCK_W<'_, PLLCSR_SPEC> {
                PLOCK_W::new(self, 0)
            }
            ///Bit 1 - PLL Enable
            #[inline(always)]
            pub fn plle(&mut self) -> PLLE_W<'_, PLLCSR_SPEC> {
                PLLE_W::new(self, 1)
            }
            ///Bit 2 - PCK Enable
            #[inline(always)]
            pub fn pcke(&mut self) -> PCKE_W<'_, PLLCSR_SPEC> {
                PCKE_W::new(self, 2)
            }
            ///Bit 7 - Low speed mode
            #[inline(always)]
            pub fn lsm(&mut self) -> LSM_W<'_, PLLCSR_SPEC> {
                LSM_W::new(self, 7)
            }
        }
        /**PLL Control and status register

You can [`read`](crate::Reg::read) this register and get [`pllcsr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pllcsr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct PLLCSR_SPEC;
        impl crate::RegisterSpec for PLLCSR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`pllcsr::R`](R) reader structure
        impl crate::Readable for PLLCSR_SPEC {}
        ///`write(|w| ..)` method takes [`pllcsr::W`](W) writer structure
        impl crate::Writable for PLLCSR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets PLLCSR to value 0
        impl crate::Resettable for PLLCSR_SPEC {}
    }
    /**PRR (rw) register accessor: Power Reduction Register

You can [`read`](crate::Reg::read) this register and get [`prr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`prr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@prr`] module*/
    pub type PRR = crate::Reg<prr::PRR_SPEC>;
    ///Power Reduction Register
    pub mod prr {
        ///Register `PRR` reader
        pub type R = crate::R<PRR_SPEC>;
        ///Register `PRR` writer
        pub type W = crate::W<PRR_SPEC>;
        ///Field `PRADC` reader - Power Reduction ADC
        pub type PRADC_R = crate::BitReader;
        ///Field `PRADC` writer - Power Reduction ADC
        pub type PRADC_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PRUSI` reader - Power Reduction USI
        pub type PRUSI_R = crate::BitReader;
        ///Field `PRUSI` writer - Power Reduction USI
        pub type PRUSI_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PRTIM0` reader - Power Reduction Timer/Counter0
        pub type PRTIM0_R = crate::BitReader;
        ///Field `PRTIM0` writer - Power Reduction Timer/Counter0
        pub type PRTIM0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PRTIM1` reader - Power Reduction Timer/Counter1
        pub type PRTIM1_R = crate::BitReader;
        ///Field `PRTIM1` writer - Power Reduction Timer/Counter1
        pub type PRTIM1_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Power Reduction ADC
            #[inline(always)]
            pub fn pradc(&self) -> PRADC_R {
                PRADC_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Power Reduction USI
            #[inline(always)]
            pub fn prusi(&self) -> PRUSI_R {
                PRUSI_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Power Reduction Timer/Counter0
            #[inline(always)]
            pub fn prtim0(&self) -> PRTIM0_R {
                PRTIM0_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Power Reduction Timer/Counter1
            #[inline(always)]
            pub fn prtim1(&self) -> PRTIM1_R {
                PRTIM1_R::new(((self.bits >> 3) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Power Reduction ADC
            #[inline(always)]
            pub fn pradc(&mut self) -> PRADC_W<'_, PRR_SPEC> {
                PRADC_W::new(self, 0)
            }
            ///Bit 1 - Power Reduction USI
            #[inline(always)]
            pub fn prusi(&mut self) -> PRUSI_W<'_, PRR_SPEC> {
                PRUSI_W::new(self, 1)
            }
            ///Bit 2 - Power Reduction Timer/Counter0
            #[inline(always)]
            pub fn prtim0(&mut self) -> PRTIM0_W<'_, PRR_SPEC> {
                PRTIM0_W::new(self, 2)
            }
            ///Bit 3 - Power Reduction Timer/Counter1
            #[inline(always)]
            pub fn prtim1(&mut self) -> PRTIM1_W<'_, PRR_SPEC> {
                PRTIM1_W::new(self, 3)
            }
        }
        /**Power Reduction Register

You can [`read`](crate::Reg::read) this register and get [`prr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`prr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct PRR_SPEC;
        impl crate::RegisterSpec for PRR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`prr::R`](R) reader structure
        impl crate::Readable for PRR_SPEC {}
        ///`write(|w| ..)` method takes [`prr::W`](W) writer structure
        impl crate::Writable for PRR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets PRR to value 0
        impl crate::Resettable for PRR_SPEC {}
    }
}
///EEPROM
pub type EEPROM = crate::Periph<eeprom::RegisterBlock, 0x3c>;
impl core::fmt::Debug for EEPROM {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("EEPROM").finish()
    }
}
///EEPROM
pub mod eeprom {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        eecr: EECR,
        eedr: EEDR,
        eear: EEAR,
    }
    impl RegisterBlock {
        ///0x00 - EEPROM Control Register
        #[inline(always)]
        pub const fn eecr(&self) -> &EECR {
            &self.eecr
        }
        ///0x01 - EEPROM Data Register
        #[inline(always)]
        pub const fn eedr(&self) -> &EEDR {
            &self.eedr
        }
        ///0x02 - EEPROM Address Register Bytes
        #[inline(always)]
        pub const fn eear(&self) -> &EEAR {
            &self.eear
        }
    }
    /**EEAR (rw) register accessor: EEPROM Address Register Bytes

You can [`read`](crate::Reg::read) this register and get [`eear::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`eear::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@eear`] module*/
    pub type EEAR = crate::Reg<eear::EEAR_SPEC>;
    ///EEPROM Address Register Bytes
    pub mod eear {
        ///Register `EEAR` reader
        pub type R = crate::R<EEAR_SPEC>;
        ///Register `EEAR` writer
        pub type W = crate::W<EEAR_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**EEPROM Address Register Bytes

You can [`read`](crate::Reg::read) this register and get [`eear::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`eear::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct EEAR_SPEC;
        impl crate::RegisterSpec for EEAR_SPEC {
            type Ux = u16;
        }
        ///`read()` method returns [`eear::R`](R) reader structure
        impl crate::Readable for EEAR_SPEC {}
        ///`write(|w| ..)` method takes [`eear::W`](W) writer structure
        impl crate::Writable for EEAR_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets EEAR to value 0
        impl crate::Resettable for EEAR_SPEC {}
    }
    /**EECR (rw) register accessor: EEPROM Control Register

You can [`read`](crate::Reg::read) this register and get [`eecr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`eecr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@eecr`] module*/
    pub type EECR = crate::Reg<eecr::EECR_SPEC>;
    ///EEPROM Control Register
    pub mod eecr {
        ///Register `EECR` reader
        pub type R = crate::R<EECR_SPEC>;
        ///Register `EECR` writer
        pub type W = crate::W<EECR_SPEC>;
        ///Field `EERE` reader - EEPROM Read Enable
        pub type EERE_R = crate::BitReader;
        ///Field `EERE` writer - EEPROM Read Enable
        pub type EERE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `EEPE` reader - EEPROM Write Enable
        pub type EEPE_R = crate::BitReader;
        ///Field `EEPE` writer - EEPROM Write Enable
        pub type EEPE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `EEMPE` reader - EEPROM Master Write Enable
        pub type EEMPE_R = crate::BitReader;
        ///Field `EEMPE` writer - EEPROM Master Write Enable
        pub type EEMPE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `EERIE` reader - EEPROM Ready Interrupt Enable
        pub type EERIE_R = crate::BitReader;
        ///Field `EERIE` writer - EEPROM Ready Interrupt Enable
        pub type EERIE_W<'a, REG> = crate::BitWriter<'a, REG>;
        /**EEPROM Programming Mode Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum EEPM_A {
            ///0: Erase and Write in one operation
            ERASE_AND_WRITE_IN_ONE_OPERATION = 0,
            ///1: Erase Only
            ERASE_ONLY = 1,
            ///2: Write Only
            WRITE_ONLY = 2,
        }
        impl From<EEPM_A> for u8 {
            #[inline(always)]
            fn from(variant: EEPM_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for EEPM_A {
            type Ux = u8;
        }
        impl crate::IsEnum for EEPM_A {}
        ///Field `EEPM` reader - EEPROM Programming Mode Bits
        pub type EEPM_R = crate::FieldReader<EEPM_A>;
        impl EEPM_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> Option<EEPM_A> {
                match self.bits {
                    0 => Some(EEPM_A::ERASE_AND_WRITE_IN_ONE_OPERATION),
                    1 => Some(EEPM_A::ERASE_ONLY),
                    2 => Some(EEPM_A::WRITE_ONLY),
                    _ => None,
                }
            }
            ///Erase and Write in one operation
            #[inline(always)]
            pub fn is_erase_and_write_in_one_operation(&self) -> bool {
                *self == EEPM_A::ERASE_AND_WRITE_IN_ONE_OPERATION
            }
            ///Erase Only
            #[inline(always)]
            pub fn is_erase_only(&self) -> bool {
                *self == EEPM_A::ERASE_ONLY
            }
            ///Write Only
            #[inline(always)]
            pub fn is_write_only(&self) -> bool {
                *self == EEPM_A::WRITE_ONLY
            }
        }
        ///Field `EEPM` writer - EEPROM Programming Mode Bits
        pub type EEPM_W<'a, REG> = crate::FieldWriter<'a, REG, 2, EEPM_A>;
        impl<'a, REG> EEPM_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Erase and Write in one operation
            #[inline(always)]
            pub fn erase_and_write_in_one_operation(self) -> &'a mut crate::W<REG> {
                self.variant(EEPM_A::ERASE_AND_WRITE_IN_ONE_OPERATION)
            }
            ///Erase Only
            #[inline(always)]
            pub fn erase_only(self) -> &'a mut crate::W<REG> {
                self.variant(EEPM_A::ERASE_ONLY)
            }
            ///Write Only
            #[inline(always)]
            pub fn write_only(self) -> &'a mut crate::W<REG> {
                self.variant(EEPM_A::WRITE_ONLY)
            }
        }
        impl R {
            ///Bit 0 - EEPROM Read Enable
            #[inline(always)]
            pub fn eere(&self) -> EERE_R {
                EERE_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - EEPROM Write Enable
            #[inline(always)]
            pub fn eepe(&self) -> EEPE_R {
                EEPE_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - EEPROM Master Write Enable
            #[inline(always)]
            pub fn eempe(&self) -> EEMPE_R {
                EEMPE_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - EEPROM Ready Interrupt Enable
            #[inline(always)]
            pub fn eerie(&self) -> EERIE_R {
                EERIE_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bits 4:5 - EEPROM Programming Mode Bits
            #[inline(always)]
            pub fn eepm(&self) -> EEPM_R {
                EEPM_R::new((self.bits >> 4) & 3)
            }
        }
        impl W {
            ///Bit 0 - EEPROM Read Enable
            #[inline(always)]
            pub fn eere(&mut self) -> EERE_W<'_, EECR_SPEC> {
                EERE_W::new(self, 0)
            }
            ///Bit 1 - EEPROM Write Enable
            #[inline(always)]
            pub fn eepe(&mut self) -> EEPE_W<'_, EECR_SPEC> {
                EEPE_W::new(self, 1)
            }
            ///Bit 2 - EEPROM Master Write Enable
            #[inline(always)]
            pub fn eempe(&mut self) -> EEMPE_W<'_, EECR_SPEC> {
                EEMPE_W::new(self, 2)
            }
            ///Bit 3 - EEPROM Ready Interrupt Enable
            #[inline(always)]
            pub fn eerie(&mut self) -> EERIE_W<'_, EECR_SPEC> {
                EERIE_W::new(self, 3)
            }
            ///Bits 4:5 - EEPROM Programming Mode Bits
            #[inline(always)]
            pub fn eepm(&mut self) -> EEPM_W<'_, EECR_SPEC> {
                EEPM_W::new(self, 4)
            }
        }
        /**EEPROM Control Register

You can [`read`](crate::Reg::read) this register and get [`eecr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`eecr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct EECR_SPEC;
        impl crate::RegisterSpec for EECR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`eecr::R`](R) reader structure
        impl crate::Readable for EECR_SPEC {}
        ///`write(|w| ..)` method takes [`eecr::W`](W) writer structure
        impl crate::Writable for EECR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets EECR to value 0
        impl crate::Resettable for EECR_SPEC {}
    }
    /**EEDR (rw) register accessor: EEPROM Data Register

You can [`read`](crate::Reg::read) this register and get [`eedr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`eedr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@eedr`] module*/
    pub type EEDR = crate::Reg<eedr::EEDR_SPEC>;
    ///EEPROM Data Register
    pub mod eedr {
        ///Register `EEDR` reader
        pub type R = crate::R<EEDR_SPEC>;
        ///Register `EEDR` writer
        pub type W = crate::W<EEDR_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**EEPROM Data Register

You can [`read`](crate::Reg::read) this register and get [`eedr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`eedr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct EEDR_SPEC;
        impl crate::RegisterSpec for EEDR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`eedr::R`](R) reader structure
        impl crate::Readable for EEDR_SPEC {}
        ///`write(|w| ..)` method takes [`eedr::W`](W) writer structure
        impl crate::Writable for EEDR_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets EEDR to value 0
        impl crate::Resettable for EEDR_SPEC {}
    }
}
///External Interrupts
pub type EXINT = crate::Periph<exint::RegisterBlock, 0x42>;
impl core::fmt::Debug for EXINT {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("EXINT").finish()
    }
}
///External Interrupts
pub mod exint {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        pcmsk1: PCMSK1,
        pcmsk0: PCMSK0,
        _reserved2: [u8; 0x11],
        mcucr: MCUCR,
        _reserved3: [u8; 0x04],
        gifr: GIFR,
        gimsk: GIMSK,
    }
    impl RegisterBlock {
        ///0x00 - Pin Change Enable Mask 1
        #[inline(always)]
        pub const fn pcmsk1(&self) -> &PCMSK1 {
            &self.pcmsk1
        }
        ///0x01 - Pin Change Enable Mask 0
        #[inline(always)]
        pub const fn pcmsk0(&self) -> &PCMSK0 {
            &self.pcmsk0
        }
        ///0x13 - MCU Control Register
        #[inline(always)]
        pub const fn mcucr(&self) -> &MCUCR {
            &self.mcucr
        }
        ///0x18 - General Interrupt Flag register
        #[inline(always)]
        pub const fn gifr(&self) -> &GIFR {
            &self.gifr
        }
        ///0x19 - General Interrupt Mask Register
        #[inline(always)]
        pub const fn gimsk(&self) -> &GIMSK {
            &self.gimsk
        }
    }
    /**GIFR (rw) register accessor: General Interrupt Flag register

You can [`read`](crate::Reg::read) this register and get [`gifr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gifr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@gifr`] module*/
    pub type GIFR = crate::Reg<gifr::GIFR_SPEC>;
    ///General Interrupt Flag register
    pub mod gifr {
        ///Register `GIFR` reader
        pub type R = crate::R<GIFR_SPEC>;
        ///Register `GIFR` writer
        pub type W = crate::W<GIFR_SPEC>;
        ///Field `PCIF` reader - Pin Change Interrupt Flag
        pub type PCIF_R = crate::BitReader;
        ///Field `PCIF` writer - Pin Change Interrupt Flag
        pub type PCIF_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `INTF` reader - External Interrupt Flags
        pub type INTF_R = crate::FieldReader;
        ///Field `INTF` writer - External Interrupt Flags
        pub type INTF_W<'a, REG> = crate::FieldWriter<'a, REG, 2, u8, crate::Safe>;
        impl R {
            ///Bit 5 - Pin Change Interrupt Flag
            #[inline(always)]
            pub fn pcif(&self) -> PCIF_R {
                PCIF_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bits 6:7 - External Interrupt Flags
            #[inline(always)]
            pub fn intf(&self) -> INTF_R {
                INTF_R::new((self.bits >> 6) & 3)
            }
        }
        impl W {
            ///Bit 5 - Pin Change Interrupt Flag
            #[inline(always)]
            pub fn pcif(&mut self) -> PCIF_W<'_, GIFR_SPEC> {
                PCIF_W::new(self, 5)
            }
            ///Bits 6:7 - External Interrupt Flags
            #[inline(always)]
            pub fn intf(&mut self) -> INTF_W<'_, GIFR_SPEC> {
                INTF_W::new(self, 6)
            }
        }
        /**General Interrupt Flag register

You can [`read`](crate::Reg::read) this register and get [`gifr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gifr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct GIFR_SPEC;
        impl crate::RegisterSpec for GIFR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`gifr::R`](R) reader structure
        impl crate::Readable for GIFR_SPEC {}
        ///`write(|w| ..)` method takes [`gifr::W`](W) writer structure
        impl crate::Writable for GIFR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets GIFR to value 0
        impl crate::Resettable for GIFR_SPEC {}
    }
    /**GIMSK (rw) register accessor: General Interrupt Mask Register

You can [`read`](crate::Reg::read) this register and get [`gimsk::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gimsk::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@gimsk`] module*/
    pub type GIMSK = crate::Reg<gimsk::GIMSK_SPEC>;
    ///General Interrupt Mask Register
    pub mod gimsk {
        ///Register `GIMSK` reader
        pub type R = crate::R<GIMSK_SPEC>;
        ///Register `GIMSK` writer
        pub type W = crate::W<GIMSK_SPEC>;
        ///Field `PCIE` reader - Pin Change Interrupt Enables
        pub type PCIE_R = crate::FieldReader;
        ///Field `PCIE` writer - Pin Change Interrupt Enables
        pub type PCIE_W<'a, REG> = crate::FieldWriter<'a, REG, 2, u8, crate::Safe>;
        ///Field `INT` reader - External Interrupt Request 1 Enable
        pub type INT_R = crate::FieldReader;
        ///Field `INT` writer - External Interrupt Request 1 Enable
        pub type INT_W<'a, REG> = crate::FieldWriter<'a, REG, 2, u8, crate::Safe>;
        impl R {
            ///Bits 4:5 - Pin Change Interrupt Enables
            #[inline(always)]
            pub fn pcie(&self) -> PCIE_R {
                PCIE_R::new((self.bits >> 4) & 3)
            }
            ///Bits 6:7 - External Interrupt Request 1 Enable
            #[inline(always)]
            pub fn int(&self) -> INT_R {
                INT_R::new((self.bits >> 6) & 3)
            }
        }
        impl W {
            ///Bits 4:5 - Pin Change Interrupt Enables
            #[inline(always)]
            pub fn pcie(&mut self) -> PCIE_W<'_, GIMSK_SPEC> {
                PCIE_W::new(self, 4)
            }
            ///Bits 6:7 - External Interrupt Request 1 Enable
            #[inline(always)]
            pub fn int(&mut self) -> INT_W<'_, GIMSK_SPEC> {
                INT_W::new(self, 6)
            }
        }
        /**General Interrupt Mask Register

You can [`read`](crate::Reg::read) this register and get [`gimsk::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`gimsk::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct GIMSK_SPEC;
        impl crate::RegisterSpec for GIMSK_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`gimsk::R`](R) reader structure
        impl crate::Readable for GIMSK_SPEC {}
        ///`write(|w| ..)` method takes [`gimsk::W`](W) writer structure
        impl crate::Writable for GIMSK_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets GIMSK to value 0
        impl crate::Resettable for GIMSK_SPEC {}
    }
    /**MCUCR (rw) register accessor: MCU Control Register

You can [`read`](crate::Reg::read) this register and get [`mcucr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`mcucr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@mcucr`] module*/
    pub type MCUCR = crate::Reg<mcucr::MCUCR_SPEC>;
    ///MCU Control Register
    pub mod mcucr {
        ///Register `MCUCR` reader
        pub type R = crate::R<MCUCR_SPEC>;
        ///Register `MCUCR` writer
        pub type W = crate::W<MCUCR_SPEC>;
        /**Interrupt Sense Control 0 Bit 0

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum ISC00_A {
            ///0: Low Level of INTX
            LOW_LEVEL_OF_INTX = 0,
            ///1: Any Logical Change of INTX
            ANY_LOGICAL_CHANGE_OF_INTX = 1,
        }
        impl From<ISC00_A> for bool {
            #[inline(always)]
            fn from(variant: ISC00_A) -> Self {
                variant as u8 != 0
            }
        }
        ///Field `ISC00` reader - Interrupt Sense Control 0 Bit 0
        pub type ISC00_R = crate::BitReader<ISC00_A>;
        impl ISC00_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> ISC00_A {
                match self.bits {
                    false => ISC00_A::LOW_LEVEL_OF_INTX,
                    true => ISC00_A::ANY_LOGICAL_CHANGE_OF_INTX,
                }
            }
            ///Low Level of INTX
            #[inline(always)]
            pub fn is_low_level_of_intx(&self) -> bool {
                *self == ISC00_A::LOW_LEVEL_OF_INTX
            }
            ///Any Logical Change of INTX
            #[inline(always)]
            pub fn is_any_logical_change_of_intx(&self) -> bool {
                *self == ISC00_A::ANY_LOGICAL_CHANGE_OF_INTX
            }
        }
        ///Field `ISC00` writer - Interrupt Sense Control 0 Bit 0
        pub type ISC00_W<'a, REG> = crate::BitWriter<'a, REG, ISC00_A>;
        impl<'a, REG> ISC00_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
        {
            ///Low Level of INTX
            #[inline(always)]
            pub fn low_level_of_intx(self) -> &'a mut crate::W<REG> {
                self.variant(ISC00_A::LOW_LEVEL_OF_INTX)
            }
            ///Any Logical Change of INTX
            #[inline(always)]
            pub fn any_logical_change_of_intx(self) -> &'a mut crate::W<REG> {
                self.variant(ISC00_A::ANY_LOGICAL_CHANGE_OF_INTX)
            }
        }
        ///Field `ISC01` reader - Interrupt Sense Control 0 Bit 1
        pub type ISC01_R = crate::BitReader;
        ///Field `ISC01` writer - Interrupt Sense Control 0 Bit 1
        pub type ISC01_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Interrupt Sense Control 0 Bit 0
            #[inline(always)]
            pub fn isc00(&self) -> ISC00_R {
                ISC00_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Interrupt Sense Control 0 Bit 1
            #[inline(always)]
            pub fn isc01(&self) -> ISC01_R {
                ISC01_R::new(((self.bits >> 1) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Interrupt Sense Control 0 Bit 0
            #[inline(always)]
            pub fn isc00(&mut self) -> ISC00_W<'_, MCUCR_SPEC> {
                ISC00_W::new(self, 0)
            }
            ///Bit 1 - Interrupt Sense Control 0 Bit 1
            #[inline(always)]
            pub fn isc01(&mut self) -> ISC01_W<'_, MCUCR_SPEC> {
                ISC01_W::new(self, 1)
            }
        }
        /**MCU Control Register

You can [`read`](crate::Reg::read) this register and get [`mcucr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`mcucr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct MCUCR_SPEC;
        impl crate::RegisterSpec for MCUCR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`mcucr::R`](R) reader structure
        impl crate::Readable for MCUCR_SPEC {}
        ///`write(|w| ..)` method takes [`mcucr::W`](W) writer structure
        impl crate::Writable for MCUCR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets MCUCR to value 0
        impl crate::Resettable for MCUCR_SPEC {}
    }
    /**PCMSK0 (rw) register accessor: Pin Change Enable Mask 0

You can [`read`](crate::Reg::read) this register and get [`pcmsk0::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pcmsk0::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@pcmsk0`] module*/
    pub type PCMSK0 = crate::Reg<pcmsk0::PCMSK0_SPEC>;
    ///Pin Change Enable Mask 0
    pub mod pcmsk0 {
        ///Register `PCMSK0` reader
        pub type R = crate::R<PCMSK0_SPEC>;
        ///Register `PCMSK0` writer
        pub type W = crate::W<PCMSK0_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Pin Change Enable Mask 0

You can [`read`](crate::Reg::read) this register and get [`pcmsk0::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pcmsk0::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct PCMSK0_SPEC;
        impl crate::RegisterSpec for PCMSK0_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`pcmsk0::R`](R) reader structure
        impl crate::Readable for PCMSK0_SPEC {}
        ///`write(|w| ..)` method takes [`pcmsk0::W`](W) writer structure
        impl crate::Writable for PCMSK0_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets PCMSK0 to value 0
        impl crate::Resettable for PCMSK0_SPEC {}
    }
    /**PCMSK1 (rw) register accessor: Pin Change Enable Mask 1

You can [`read`](crate::Reg::read) this register and get [`pcmsk1::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pcmsk1::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@pcmsk1`] module*/
    pub type PCMSK1 = crate::Reg<pcmsk1::PCMSK1_SPEC>;
    ///Pin Change Enable Mask 1
    pub mod pcmsk1 {
        ///Register `PCMSK1` reader
        pub type R = crate::R<PCMSK1_SPEC>;
        ///Register `PCMSK1` writer
        pub type W = crate::W<PCMSK1_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Pin Change Enable Mask 1

You can [`read`](crate::Reg::read) this register and get [`pcmsk1::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pcmsk1::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct PCMSK1_SPEC;
        impl crate::RegisterSpec for PCMSK1_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`pcmsk1::R`](R) reader structure
        impl crate::Readable for PCMSK1_SPEC {}
        ///`write(|w| ..)` method takes [`pcmsk1::W`](W) writer structure
        impl crate::Writable for PCMSK1_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets PCMSK1 to value 0
        impl crate::Resettable for PCMSK1_SPEC {}
    }
}
///Fuses
pub type FUSE = crate::Periph<fuse::RegisterBlock, 0>;
impl core::fmt::Debug for FUSE {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("FUSE").finish()
    }
}
///Fuses
pub mod fuse {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        low: LOW,
        high: HIGH,
        extended: EXTENDED,
    }
    impl RegisterBlock {
        ///0x00 - No Description.
        #[inline(always)]
        pub const fn low(&self) -> &LOW {
            &self.low
        }
        ///0x01 - No Description.
        #[inline(always)]
        pub const fn high(&self) -> &HIGH {
            &self.high
        }
        ///0x02 - No Description.
        #[inline(always)]
        pub const fn extended(&self) -> &EXTENDED {
            &self.extended
        }
    }
    /**EXTENDED (r) register accessor: No Description.

You can [`read`](crate::Reg::read) this register and get [`extended::R`]. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@extended`] module*/
    pub type EXTENDED = crate::Reg<extended::EXTENDED_SPEC>;
    ///No Description.
    pub mod extended {
        ///Register `EXTENDED` reader
        pub type R = crate::R<EXTENDED_SPEC>;
        ///Field `SELFPRGEN` reader - Self Programming enable
        pub type SELFPRGEN_R = crate::BitReader;
        impl R {
            ///Bit 0 - Self Programming enable
            #[inline(always)]
            pub fn selfprgen(&self) -> SELFPRGEN_R {
                SELFPRGEN_R::new((self.bits & 1) != 0)
            }
        }
        /**No Description.

You can [`read`](crate::Reg::read) this register and get [`extended::R`](R). See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct EXTENDED_SPEC;
        impl crate::RegisterSpec for EXTENDED_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`extended::R`](R) reader structure
        impl crate::Readable for EXTENDED_SPEC {}
        ///`reset()` method sets EXTENDED to value 0
        impl crate::Resettable for EXTENDED_SPEC {}
    }
    /**HIGH (r) register accessor: No Description.

You can [`read`](crate::Reg::read) this register and get [`high::R`]. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@high`] module*/
    pub type HIGH = crate::Reg<high::HIGH_SPEC>;
    ///No Description.
    pub mod high {
        ///Register `HIGH` reader
        pub type R = crate::R<HIGH_SPEC>;
        /**Brown-out Detector trigger level

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum BODLEVEL_A {
            ///0: Brown-out detection at VCC=2.0 V
            _2V0 = 0,
            ///1: Brown-out detection at VCC=1.9 V
            _1V9 = 1,
            ///2: Brown-out detection at VCC=2.2 V
            _2V2 = 2,
            ///3: Brown-out detection at VCC=2.3 V
            _2V3 = 3,
            ///4: Brown-out detection at VCC=4.3 V
            _4V3 = 4,
            ///5: Brown-out detection at VCC=2.7 V
            _2V7 = 5,
            ///6: Brown-out detection at VCC=1.8 V
            _1V8 = 6,
            ///7: Brown-out detection disabled
            DISABLED = 7,
        }
        impl From<BODLEVEL_A> for u8 {
            #[inline(always)]
            fn from(variant: BODLEVEL_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for BODLEVEL_A {
            type Ux = u8;
        }
        impl crate::IsEnum for BODLEVEL_A {}
        ///Field `BODLEVEL` reader - Brown-out Detector trigger level
        pub type BODLEVEL_R = crate::FieldReader<BODLEVEL_A>;
        impl BODLEVEL_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> BODLEVEL_A {
                match self.bits {
                    0 => BODLEVEL_A::_2V0,
                    1 => BODLEVEL_A::_1V9,
                    2 => BODLEVEL_A::_2V2,
                    3 => BODLEVEL_A::_2V3,
                    4 => BODLEVEL_A::_4V3,
                    5 => BODLEVEL_A::_2V7,
                    6 => BODLEVEL_A::_1V8,
                    7 => BODLEVEL_A::DISABLED,
                    _ => unreachable!(),
                }
            }
            ///Brown-out detection at VCC=2.0 V
            #[inline(always)]
            pub fn is_2v0(&self) -> bool {
                *self == BODLEVEL_A::_2V0
            }
            ///Brown-out detection at VCC=1.9 V
            #[inline(always)]
            pub fn is_1v9(&self) -> bool {
                *self == BODLEVEL_A::_1V9
            }
            ///Brown-out detection at VCC=2.2 V
            #[inline(always)]
            pub fn is_2v2(&self) -> bool {
                *self == BODLEVEL_A::_2V2
            }
            ///Brown-out detection at VCC=2.3 V
            #[inline(always)]
            pub fn is_2v3(&self) -> bool {
                *self == BODLEVEL_A::_2V3
            }
            ///Brown-out detection at VCC=4.3 V
            #[inline(always)]
            pub fn is_4v3(&self) -> bool {
                *self == BODLEVEL_A::_4V3
            }
            ///Brown-out detection at VCC=2.7 V
            #[inline(always)]
            pub fn is_2v7(&self) -> bool {
                *self == BODLEVEL_A::_2V7
            }
            ///Brown-out detection at VCC=1.8 V
            #[inline(always)]
            pub fn is_1v8(&self) -> bool {
                *self == BODLEVEL_A::_1V8
            }
            ///Brown-out detection disabled
            #[inline(always)]
            pub fn is_disabled(&self) -> bool {
                *self == BODLEVEL_A::DISABLED
            }
        }
        ///Field `EESAVE` reader - Preserve EEPROM through the Chip Erase cycle
        pub type EESAVE_R = crate::BitReader;
        ///Field `WDTON` reader - Watch-dog Timer always on
        pub type WDTON_R = crate::BitReader;
        ///Field `SPIEN` reader - Serial program downloading (SPI) enabled
        pub type SPIEN_R = crate::BitReader;
        ///Field `DWEN` reader - Debug Wire enable
        pub type DWEN_R = crate::BitReader;
        ///Field `RSTDISBL` reader - Reset Disabled (Enable PB7 as i/o pin)
        pub type RSTDISBL_R = crate::BitReader;
        impl R {
            ///Bits 0:2 - Brown-out Detector trigger level
            #[inline(always)]
            pub fn bodlevel(&self) -> BODLEVEL_R {
                BODLEVEL_R::new(self.bits & 7)
            }
            ///Bit 3 - Preserve EEPROM through the Chip Erase cycle
            #[inline(always)]
            pub fn eesave(&self) -> EESAVE_R {
                EESAVE_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Watch-dog Timer always on
            #[inline(always)]
            pub fn wdton(&self) -> WDTON_R {
                WDTON_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Serial program downloading (SPI) enabled
            #[inline(always)]
            pub fn spien(&self) -> SPIEN_R {
                SPIEN_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Debug Wire enable
            #[inline(always)]
            pub fn dwen(&self) -> DWEN_R {
                DWEN_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Reset Disabled (Enable PB7 as i/o pin)
            #[inline(always)]
            pub fn rstdisbl(&self) -> RSTDISBL_R {
                RSTDISBL_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        /**No Description.

You can [`read`](crate::Reg::read) this register and get [`high::R`](R). See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct HIGH_SPEC;
        impl crate::RegisterSpec for HIGH_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`high::R`](R) reader structure
        impl crate::Readable for HIGH_SPEC {}
        ///`reset()` method sets HIGH to value 0
        impl crate::Resettable for HIGH_SPEC {}
    }
    /**LOW (r) register accessor: No Description.

You can [`read`](crate::Reg::read) this register and get [`low::R`]. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@low`] module*/
    pub type LOW = crate::Reg<low::LOW_SPEC>;
    ///No Description.
    pub mod low {
        ///Register `LOW` reader
        pub type R = crate::R<LOW_SPEC>;
        /**Select Clock source

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum SUT_CKSEL_A {
            ///0: Ext. Clock; Start-up time PWRDWN/RESET: 6 CK/14 CK + 0 ms
            EXTCLK_6CK_14CK_0MS = 0,
            ///1: PLL Clock; Start-up time PWRDWN/RESET: 1K CK/14 CK + 8 ms
            PLLCLK_1KCK_14CK_8MS = 1,
            ///2: Int. RC Osc. 8 MHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 0 ms
            INTRCOSC_8MHZ_6CK_14CK_0MS = 2,
            ///3: WD. Osc. 128 kHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 0 ms
            WDOSC_128KHZ_6CK_14CK_0MS = 3,
            ///4: Ext. Low-Freq. Crystal; Start-up time PWRDWN/RESET: 1 CK 4 ms
            EXTLOFXTAL_1CK_4MS = 4,
            ///8: Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 4.1 ms
            EXTCRES_0MHZ4_0MHZ9_258CK_14CK_4MS1 = 8,
            ///9: Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 65 ms
            EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_65MS = 9,
            ///10: Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 4.1 ms
            EXTCRES_0MHZ9_3MHZ_258CK_14CK_4MS1 = 10,
            ///11: Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 65 ms
            EXTCRES_0MHZ9_3MHZ_1KCK_14CK_65MS = 11,
            ///12: Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 4.1 ms
            EXTCRES_3MHZ_8MHZ_258CK_14CK_4MS1 = 12,
            ///13: Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 65 ms
            EXTCRES_3MHZ_8MHZ_1KCK_14CK_65MS = 13,
            ///14: Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 4.1 ms
            EXTCRES_8MHZ_XX_258CK_14CK_4MS1 = 14,
            ///15: Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 65 ms
            EXTCRES_8MHZ_XX_1KCK_14CK_65MS = 15,
            ///16: Ext. Clock; Start-up time PWRDWN/RESET: 6 CK/14 CK + 4 ms
            EXTCLK_6CK_14CK_4MS = 16,
            ///17: PLL Clock; Start-up time PWRDWN/RESET: 16K CK/14 CK + 8 ms
            PLLCLK_16KCK_14CK_8MS = 17,
            ///18: Int. RC Osc. 8 MHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 4 ms
            INTRCOSC_8MHZ_6CK_14CK_4MS = 18,
            ///19: WD. Osc. 128 kHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 4 ms
            WDOSC_128KHZ_6CK_14CK_4MS = 19,
            ///20: Ext. Low-Freq. Crystal; Start-up time PWRDWN/RESET: 1 CK + 64 ms
            EXTLOFXTAL_1CK_64MS = 20,
            ///24: Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 65 ms
            EXTCRES_0MHZ4_0MHZ9_258CK_14CK_65MS = 24,
            ///25: Ext. Crystal Osc. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 0 ms
            EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_0MS = 25,
            ///26: Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 65 ms
            EXTCRES_0MHZ9_3MHZ_258CK_14CK_65MS = 26,
            ///27: Ext. Crystal Osc. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 0 ms
            EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_0MS = 27,
            ///28: Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 65 ms
            EXTCRES_3MHZ_8MHZ_258CK_14CK_65MS = 28,
            ///29: Ext. Crystal Osc. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 0 ms
            EXTXOSC_3MHZ_8MHZ_16KCK_14CK_0MS = 29,
            ///30: Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 65 ms
            EXTCRES_8MHZ_XX_258CK_14CK_65MS = 30,
            ///31: Ext. Crystal Osc. 8.0- MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 0 ms
            EXTXOSC_8MHZ_XX_16KCK_14CK_0MS = 31,
            ///32: Ext. Clock; Start-up time PWRDWN/RESET: 6 CK/14 CK + 64 ms
            EXTCLK_6CK_14CK_64MS = 32,
            ///33: PLL Clock; Start-up time PWRDWN/RESET: 1K CK/14 CK + 68 ms
            PLLCLK_1KCK_14CK_68MS = 33,
            ///34: Int. RC Osc. 8 MHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 64 ms
            INTRCOSC_8MHZ_6CK_14CK_64MS = 34,
            ///35: WD. Osc. 128 kHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 64 ms
            WDOSC_128KHZ_6CK_14CK_64MS = 35,
            ///36: Ext. Low-Freq. Crystal; Start-up time PWRDWN/RESET: 32 CK + 64 ms
            EXTLOFXTAL_32CK_64MS = 36,
            ///40: Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 0 ms
            EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_0MS = 40,
            ///41: Ext. Crystal Osc. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 4.1 ms
            EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_4MS1 = 41,
            ///42: Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 0 ms
            EXTCRES_0MHZ9_3MHZ_1KCK_14CK_0MS = 42,
            ///43: Ext. Crystal Osc. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 4.1 ms
            EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_4MS1 = 43,
            ///44: Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 0 ms
            EXTCRES_3MHZ_8MHZ_1KCK_14CK_0MS = 44,
            ///45: Ext. Crystal Osc. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 4.1 ms
            EXTXOSC_3MHZ_8MHZ_16KCK_14CK_4MS1 = 45,
            ///46: Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 0 ms
            EXTCRES_8MHZ_XX_1KCK_14CK_0MS = 46,
            ///47: Ext. Crystal Osc. 8.0- MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 4.1 ms
            EXTXOSC_8MHZ_XX_16KCK_14CK_4MS1 = 47,
            ///49: PLL Clock; Start-up time PWRDWN/RESET: 16K CK/14 CK + 68 ms
            PLLCLK_16KCK_14CK_68MS = 49,
            ///56: Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 4.1 ms
            EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_4MS1 = 56,
            ///57: Ext. Crystal Osc. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 65 ms
            EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_65MS = 57,
            ///58: Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 4.1 ms
            EXTCRES_0MHZ9_3MHZ_1KCK_14CK_4MS1 = 58,
            ///59: Ext. Crystal Osc. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 65 ms
            EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_65MS = 59,
            ///60: Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 4.1 ms
            EXTCRES_3MHZ_8MHZ_1KCK_14CK_4MS1 = 60,
            ///61: Ext. Crystal Osc. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 65 ms
            EXTXOSC_3MHZ_8MHZ_16KCK_14CK_65MS = 61,
            ///62: Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 4.1 ms
            EXTCRES_8MHZ_XX_1KCK_14CK_4MS1 = 62,
            ///63: Ext. Crystal Osc. 8.0- MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 65 ms
            EXTXOSC_8MHZ_XX_16KCK_14CK_65MS = 63,
        }
        impl From<SUT_CKSEL_A> for u8 {
            #[inline(always)]
            fn from(variant: SUT_CKSEL_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for SUT_CKSEL_A {
            type Ux = u8;
        }
        impl crate::IsEnum for SUT_CKSEL_A {}
        ///Field `SUT_CKSEL` reader - Select Clock source
        pub type SUT_CKSEL_R = crate::FieldReader<SUT_CKSEL_A>;
        impl SUT_CKSEL_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> Option<SUT_CKSEL_A> {
                match self.bits {
                    0 => Some(SUT_CKSEL_A::EXTCLK_6CK_14CK_0MS),
                    1 => Some(SUT_CKSEL_A::PLLCLK_1KCK_14CK_8MS),
                    2 => Some(SUT_CKSEL_A::INTRCOSC_8MHZ_6CK_14CK_0MS),
                    3 => Some(SUT_CKSEL_A::WDOSC_128KHZ_6CK_14CK_0MS),
                    4 => Some(SUT_CKSEL_A::EXTLOFXTAL_1CK_4MS),
                    8 => Some(SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_258CK_14CK_4MS1),
                    9 => Some(SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_65MS),
                    10 => Some(SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_258CK_14CK_4MS1),
                    11 => Some(SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_1KCK_14CK_65MS),
                    12 => Some(SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_258CK_14CK_4MS1),
                    13 => Some(SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_1KCK_14CK_65MS),
                    14 => Some(SUT_CKSEL_A::EXTCRES_8MHZ_XX_258CK_14CK_4MS1),
                    15 => Some(SUT_CKSEL_A::EXTCRES_8MHZ_XX_1KCK_14CK_65MS),
                    16 => Some(SUT_CKSEL_A::EXTCLK_6CK_14CK_4MS),
                    17 => Some(SUT_CKSEL_A::PLLCLK_16KCK_14CK_8MS),
                    18 => Some(SUT_CKSEL_A::INTRCOSC_8MHZ_6CK_14CK_4MS),
                    19 => Some(SUT_CKSEL_A::WDOSC_128KHZ_6CK_14CK_4MS),
                    20 => Some(SUT_CKSEL_A::EXTLOFXTAL_1CK_64MS),
                    24 => Some(SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_258CK_14CK_65MS),
                    25 => Some(SUT_CKSEL_A::EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_0MS),
                    26 => Some(SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_258CK_14CK_65MS),
                    27 => Some(SUT_CKSEL_A::EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_0MS),
                    28 => Some(SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_258CK_14CK_65MS),
                    29 => Some(SUT_CKSEL_A::EXTXOSC_3MHZ_8MHZ_16KCK_14CK_0MS),
                    30 => Some(SUT_CKSEL_A::EXTCRES_8MHZ_XX_258CK_14CK_65MS),
                    31 => Some(SUT_CKSEL_A::EXTXOSC_8MHZ_XX_16KCK_14CK_0MS),
                    32 => Some(SUT_CKSEL_A::EXTCLK_6CK_14CK_64MS),
                    33 => Some(SUT_CKSEL_A::PLLCLK_1KCK_14CK_68MS),
                    34 => Some(SUT_CKSEL_A::INTRCOSC_8MHZ_6CK_14CK_64MS),
                    35 => Some(SUT_CKSEL_A::WDOSC_128KHZ_6CK_14CK_64MS),
                    36 => Some(SUT_CKSEL_A::EXTLOFXTAL_32CK_64MS),
                    40 => Some(SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_0MS),
                    41 => Some(SUT_CKSEL_A::EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_4MS1),
                    42 => Some(SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_1KCK_14CK_0MS),
                    43 => Some(SUT_CKSEL_A::EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_4MS1),
                    44 => Some(SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_1KCK_14CK_0MS),
                    45 => Some(SUT_CKSEL_A::EXTXOSC_3MHZ_8MHZ_16KCK_14CK_4MS1),
                    46 => Some(SUT_CKSEL_A::EXTCRES_8MHZ_XX_1KCK_14CK_0MS),
                    47 => Some(SUT_CKSEL_A::EXTXOSC_8MHZ_XX_16KCK_14CK_4MS1),
                    49 => Some(SUT_CKSEL_A::PLLCLK_16KCK_14CK_68MS),
                    56 => Some(SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_4MS1),
                    57 => Some(SUT_CKSEL_A::EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_65MS),
                    58 => Some(SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_1KCK_14CK_4MS1),
                    59 => Some(SUT_CKSEL_A::EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_65MS),
                    60 => Some(SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_1KCK_14CK_4MS1),
                    61 => Some(SUT_CKSEL_A::EXTXOSC_3MHZ_8MHZ_16KCK_14CK_65MS),
                    62 => Some(SUT_CKSEL_A::EXTCRES_8MHZ_XX_1KCK_14CK_4MS1),
                    63 => Some(SUT_CKSEL_A::EXTXOSC_8MHZ_XX_16KCK_14CK_65MS),
                    _ => None,
                }
            }
            ///Ext. Clock; Start-up time PWRDWN/RESET: 6 CK/14 CK + 0 ms
            #[inline(always)]
            pub fn is_extclk_6ck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCLK_6CK_14CK_0MS
            }
            ///PLL Clock; Start-up time PWRDWN/RESET: 1K CK/14 CK + 8 ms
            #[inline(always)]
            pub fn is_pllclk_1kck_14ck_8ms(&self) -> bool {
                *self == SUT_CKSEL_A::PLLCLK_1KCK_14CK_8MS
            }
            ///Int. RC Osc. 8 MHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 0 ms
            #[inline(always)]
            pub fn is_intrcosc_8mhz_6ck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::INTRCOSC_8MHZ_6CK_14CK_0MS
            }
            ///WD. Osc. 128 kHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 0 ms
            #[inline(always)]
            pub fn is_wdosc_128khz_6ck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::WDOSC_128KHZ_6CK_14CK_0MS
            }
            ///Ext. Low-Freq. Crystal; Start-up time PWRDWN/RESET: 1 CK 4 ms
            #[inline(always)]
            pub fn is_extlofxtal_1ck_4ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTLOFXTAL_1CK_4MS
            }
            ///Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extcres_0mhz4_0mhz9_258ck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_258CK_14CK_4MS1
            }
            ///Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 65 ms
            #[inline(always)]
            pub fn is_extcres_0mhz4_0mhz9_1kck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_65MS
            }
            ///Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extcres_0mhz9_3mhz_258ck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_258CK_14CK_4MS1
            }
            ///Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 65 ms
            #[inline(always)]
            pub fn is_extcres_0mhz9_3mhz_1kck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_1KCK_14CK_65MS
            }
            ///Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extcres_3mhz_8mhz_258ck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_258CK_14CK_4MS1
            }
            ///Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 65 ms
            #[inline(always)]
            pub fn is_extcres_3mhz_8mhz_1kck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_1KCK_14CK_65MS
            }
            ///Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extcres_8mhz_xx_258ck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_8MHZ_XX_258CK_14CK_4MS1
            }
            ///Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 65 ms
            #[inline(always)]
            pub fn is_extcres_8mhz_xx_1kck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_8MHZ_XX_1KCK_14CK_65MS
            }
            ///Ext. Clock; Start-up time PWRDWN/RESET: 6 CK/14 CK + 4 ms
            #[inline(always)]
            pub fn is_extclk_6ck_14ck_4ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCLK_6CK_14CK_4MS
            }
            ///PLL Clock; Start-up time PWRDWN/RESET: 16K CK/14 CK + 8 ms
            #[inline(always)]
            pub fn is_pllclk_16kck_14ck_8ms(&self) -> bool {
                *self == SUT_CKSEL_A::PLLCLK_16KCK_14CK_8MS
            }
            ///Int. RC Osc. 8 MHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 4 ms
            #[inline(always)]
            pub fn is_intrcosc_8mhz_6ck_14ck_4ms(&self) -> bool {
                *self == SUT_CKSEL_A::INTRCOSC_8MHZ_6CK_14CK_4MS
            }
            ///WD. Osc. 128 kHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 4 ms
            #[inline(always)]
            pub fn is_wdosc_128khz_6ck_14ck_4ms(&self) -> bool {
                *self == SUT_CKSEL_A::WDOSC_128KHZ_6CK_14CK_4MS
            }
            ///Ext. Low-Freq. Crystal; Start-up time PWRDWN/RESET: 1 CK + 64 ms
            #[inline(always)]
            pub fn is_extlofxtal_1ck_64ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTLOFXTAL_1CK_64MS
            }
            ///Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 65 ms
            #[inline(always)]
            pub fn is_extcres_0mhz4_0mhz9_258ck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_258CK_14CK_65MS
            }
            ///Ext. Crystal Osc. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 0 ms
            #[inline(always)]
            pub fn is_extxosc_0mhz4_0mhz9_16kck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_0MS
            }
            ///Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 65 ms
            #[inline(always)]
            pub fn is_extcres_0mhz9_3mhz_258ck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_258CK_14CK_65MS
            }
            ///Ext. Crystal Osc. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 0 ms
            #[inline(always)]
            pub fn is_extxosc_0mhz9_3mhz_16kck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_0MS
            }
            ///Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 65 ms
            #[inline(always)]
            pub fn is_extcres_3mhz_8mhz_258ck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_258CK_14CK_65MS
            }
            ///Ext. Crystal Osc. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 0 ms
            #[inline(always)]
            pub fn is_extxosc_3mhz_8mhz_16kck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_3MHZ_8MHZ_16KCK_14CK_0MS
            }
            ///Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 258 CK/14 CK + 65 ms
            #[inline(always)]
            pub fn is_extcres_8mhz_xx_258ck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_8MHZ_XX_258CK_14CK_65MS
            }
            ///Ext. Crystal Osc. 8.0- MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 0 ms
            #[inline(always)]
            pub fn is_extxosc_8mhz_xx_16kck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_8MHZ_XX_16KCK_14CK_0MS
            }
            ///Ext. Clock; Start-up time PWRDWN/RESET: 6 CK/14 CK + 64 ms
            #[inline(always)]
            pub fn is_extclk_6ck_14ck_64ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCLK_6CK_14CK_64MS
            }
            ///PLL Clock; Start-up time PWRDWN/RESET: 1K CK/14 CK + 68 ms
            #[inline(always)]
            pub fn is_pllclk_1kck_14ck_68ms(&self) -> bool {
                *self == SUT_CKSEL_A::PLLCLK_1KCK_14CK_68MS
            }
            ///Int. RC Osc. 8 MHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 64 ms
            #[inline(always)]
            pub fn is_intrcosc_8mhz_6ck_14ck_64ms(&self) -> bool {
                *self == SUT_CKSEL_A::INTRCOSC_8MHZ_6CK_14CK_64MS
            }
            ///WD. Osc. 128 kHz; Start-up time PWRDWN/RESET: 6 CK/14 CK + 64 ms
            #[inline(always)]
            pub fn is_wdosc_128khz_6ck_14ck_64ms(&self) -> bool {
                *self == SUT_CKSEL_A::WDOSC_128KHZ_6CK_14CK_64MS
            }
            ///Ext. Low-Freq. Crystal; Start-up time PWRDWN/RESET: 32 CK + 64 ms
            #[inline(always)]
            pub fn is_extlofxtal_32ck_64ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTLOFXTAL_32CK_64MS
            }
            ///Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 0 ms
            #[inline(always)]
            pub fn is_extcres_0mhz4_0mhz9_1kck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_0MS
            }
            ///Ext. Crystal Osc. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extxosc_0mhz4_0mhz9_16kck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_4MS1
            }
            ///Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 0 ms
            #[inline(always)]
            pub fn is_extcres_0mhz9_3mhz_1kck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_1KCK_14CK_0MS
            }
            ///Ext. Crystal Osc. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extxosc_0mhz9_3mhz_16kck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_4MS1
            }
            ///Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 0 ms
            #[inline(always)]
            pub fn is_extcres_3mhz_8mhz_1kck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_1KCK_14CK_0MS
            }
            ///Ext. Crystal Osc. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extxosc_3mhz_8mhz_16kck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_3MHZ_8MHZ_16KCK_14CK_4MS1
            }
            ///Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 0 ms
            #[inline(always)]
            pub fn is_extcres_8mhz_xx_1kck_14ck_0ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_8MHZ_XX_1KCK_14CK_0MS
            }
            ///Ext. Crystal Osc. 8.0- MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extxosc_8mhz_xx_16kck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_8MHZ_XX_16KCK_14CK_4MS1
            }
            ///PLL Clock; Start-up time PWRDWN/RESET: 16K CK/14 CK + 68 ms
            #[inline(always)]
            pub fn is_pllclk_16kck_14ck_68ms(&self) -> bool {
                *self == SUT_CKSEL_A::PLLCLK_16KCK_14CK_68MS
            }
            ///Ext. Ceramic Res. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extcres_0mhz4_0mhz9_1kck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ4_0MHZ9_1KCK_14CK_4MS1
            }
            ///Ext. Crystal Osc. 0.4-0.9 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 65 ms
            #[inline(always)]
            pub fn is_extxosc_0mhz4_0mhz9_16kck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_0MHZ4_0MHZ9_16KCK_14CK_65MS
            }
            ///Ext. Ceramic Res. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extcres_0mhz9_3mhz_1kck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_0MHZ9_3MHZ_1KCK_14CK_4MS1
            }
            ///Ext. Crystal Osc. 0.9-3.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 65 ms
            #[inline(always)]
            pub fn is_extxosc_0mhz9_3mhz_16kck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_0MHZ9_3MHZ_16KCK_14CK_65MS
            }
            ///Ext. Ceramic Res. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extcres_3mhz_8mhz_1kck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_3MHZ_8MHZ_1KCK_14CK_4MS1
            }
            ///Ext. Crystal Osc. 3.0-8.0 MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 65 ms
            #[inline(always)]
            pub fn is_extxosc_3mhz_8mhz_16kck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_3MHZ_8MHZ_16KCK_14CK_65MS
            }
            ///Ext. Ceramic Res. 8.0- MHz; Start-up time PWRDWN/RESET: 1K CK /14 CK + 4.1 ms
            #[inline(always)]
            pub fn is_extcres_8mhz_xx_1kck_14ck_4ms1(&self) -> bool {
                *self == SUT_CKSEL_A::EXTCRES_8MHZ_XX_1KCK_14CK_4MS1
            }
            ///Ext. Crystal Osc. 8.0- MHz; Start-up time PWRDWN/RESET: 16K CK/14 CK + 65 ms
            #[inline(always)]
            pub fn is_extxosc_8mhz_xx_16kck_14ck_65ms(&self) -> bool {
                *self == SUT_CKSEL_A::EXTXOSC_8MHZ_XX_16KCK_14CK_65MS
            }
        }
        ///Field `CKOUT` reader - Clock output on PORTB5
        pub type CKOUT_R = crate::BitReader;
        ///Field `CKDIV8` reader - Divide clock by 8 internally
        pub type CKDIV8_R = crate::BitReader;
        impl R {
            ///Bits 0:5 - Select Clock source
            #[inline(always)]
            pub fn sut_cksel(&self) -> SUT_CKSEL_R {
                SUT_CKSEL_R::new(self.bits & 0x3f)
            }
            ///Bit 6 - Clock output on PORTB5
            #[inline(always)]
            pub fn ckout(&self) -> CKOUT_R {
                CKOUT_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Divide clock by 8 internally
            #[inline(always)]
            pub fn ckdiv8(&self) -> CKDIV8_R {
                CKDIV8_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        /**No Description.

You can [`read`](crate::Reg::read) this register and get [`low::R`](R). See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct LOW_SPEC;
        impl crate::RegisterSpec for LOW_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`low::R`](R) reader structure
        impl crate::Readable for LOW_SPEC {}
        ///`reset()` method sets LOW to value 0
        impl crate::Resettable for LOW_SPEC {}
    }
}
///Lockbits
pub type LOCKBIT = crate::Periph<lockbit::RegisterBlock, 0>;
impl core::fmt::Debug for LOCKBIT {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("LOCKBIT").finish()
    }
}
///Lockbits
pub mod lockbit {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        lockbit: LOCKBIT,
    }
    impl RegisterBlock {
        ///0x00 - No Description.
        #[inline(always)]
        pub const fn lockbit(&self) -> &LOCKBIT {
            &self.lockbit
        }
    }
    /**LOCKBIT (rw) register accessor: No Description.

You can [`read`](crate::Reg::read) this register and get [`lockbit::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`lockbit::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@lockbit`] module*/
    pub type LOCKBIT = crate::Reg<lockbit::LOCKBIT_SPEC>;
    ///No Description.
    pub mod lockbit {
        ///Register `LOCKBIT` reader
        pub type R = crate::R<LOCKBIT_SPEC>;
        ///Register `LOCKBIT` writer
        pub type W = crate::W<LOCKBIT_SPEC>;
        /**Memory Lock

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum LB_A {
            ///0: Further programming and verification disabled
            PROG_VER_DISABLED = 0,
            ///2: Further programming disabled
            PROG_DISABLED = 2,
            ///3: No memory lock features enabled
            NO_LOCK = 3,
        }
        impl From<LB_A> for u8 {
            #[inline(always)]
            fn from(variant: LB_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for LB_A {
            type Ux = u8;
        }
        impl crate::IsEnum for LB_A {}
        ///Field `LB` reader - Memory Lock
        pub type LB_R = crate::FieldReader<LB_A>;
        impl LB_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> Option<LB_A> {
                match self.bits {
                    0 => Some(LB_A::PROG_VER_DISABLED),
                    2 => Some(LB_A::PROG_DISABLED),
                    3 => Some(LB_A::NO_LOCK),
                    _ => None,
                }
            }
            ///Further programming and verification disabled
            #[inline(always)]
            pub fn is_prog_ver_disabled(&self) -> bool {
                *self == LB_A::PROG_VER_DISABLED
            }
            ///Further programming disabled
            #[inline(always)]
            pub fn is_prog_disabled(&self) -> bool {
                *self == LB_A::PROG_DISABLED
            }
            ///No memory lock features enabled
            #[inline(always)]
            pub fn is_no_lock(&self) -> bool {
                *self == LB_A::NO_LOCK
            }
        }
        ///Field `LB` writer - Memory Lock
        pub type LB_W<'a, REG> = crate::FieldWriter<'a, REG, 2, LB_A>;
        impl<'a, REG> LB_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Further programming and verification disabled
            #[inline(always)]
            pub fn prog_ver_disabled(self) -> &'a mut crate::W<REG> {
                self.variant(LB_A::PROG_VER_DISABLED)
            }
            ///Further programming disabled
            #[inline(always)]
            pub fn prog_disabled(self) -> &'a mut crate::W<REG> {
                self.variant(LB_A::PROG_DISABLED)
            }
            ///No memory lock features enabled
            #[inline(always)]
            pub fn no_lock(self) -> &'a mut crate::W<REG> {
                self.variant(LB_A::NO_LOCK)
            }
        }
        impl R {
            ///Bits 0:1 - Memory Lock
            #[inline(always)]
            pub fn lb(&self) -> LB_R {
                LB_R::new(self.bits & 3)
            }
        }
        impl W {
            ///Bits 0:1 - Memory Lock
            #[inline(always)]
            pub fn lb(&mut self) -> LB_W<'_, LOCKBIT_SPEC> {
                LB_W::new(self, 0)
            }
        }
        /**No Description.

You can [`read`](crate::Reg::read) this register and get [`lockbit::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`lockbit::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct LOCKBIT_SPEC;
        impl crate::RegisterSpec for LOCKBIT_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`lockbit::R`](R) reader structure
        impl crate::Readable for LOCKBIT_SPEC {}
        ///`write(|w| ..)` method takes [`lockbit::W`](W) writer structure
        impl crate::Writable for LOCKBIT_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets LOCKBIT to value 0
        impl crate::Resettable for LOCKBIT_SPEC {}
    }
}
///I/O Port
pub type PORTA = crate::Periph<porta::RegisterBlock, 0x39>;
impl core::fmt::Debug for PORTA {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("PORTA").finish()
    }
}
///I/O Port
pub mod porta {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        pina: PINA,
        ddra: DDRA,
        porta: PORTA,
    }
    impl RegisterBlock {
        ///0x00 - Port A Input Pins
        #[inline(always)]
        pub const fn pina(&self) -> &PINA {
            &self.pina
        }
        ///0x01 - Port A Data Direction Register
        #[inline(always)]
        pub const fn ddra(&self) -> &DDRA {
            &self.ddra
        }
        ///0x02 - Port A Data Register
        #[inline(always)]
        pub const fn porta(&self) -> &PORTA {
            &self.porta
        }
    }
    /**DDRA (rw) register accessor: Port A Data Direction Register

You can [`read`](crate::Reg::read) this register and get [`ddra::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ddra::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@ddra`] module*/
    pub type DDRA = crate::Reg<ddra::DDRA_SPEC>;
    ///Port A Data Direction Register
    pub mod ddra {
        ///Register `DDRA` reader
        pub type R = crate::R<DDRA_SPEC>;
        ///Register `DDRA` writer
        pub type W = crate::W<DDRA_SPEC>;
        ///Field `PA0` reader - Pin A0
        pub type PA0_R = crate::BitReader;
        ///Field `PA0` writer - Pin A0
        pub type PA0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA1` reader - Pin A1
        pub type PA1_R = crate::BitReader;
        ///Field `PA1` writer - Pin A1
        pub type PA1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA2` reader - Pin A2
        pub type PA2_R = crate::BitReader;
        ///Field `PA2` writer - Pin A2
        pub type PA2_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA3` reader - Pin A3
        pub type PA3_R = crate::BitReader;
        ///Field `PA3` writer - Pin A3
        pub type PA3_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA4` reader - Pin A4
        pub type PA4_R = crate::BitReader;
        ///Field `PA4` writer - Pin A4
        pub type PA4_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA5` reader - Pin A5
        pub type PA5_R = crate::BitReader;
        ///Field `PA5` writer - Pin A5
        pub type PA5_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA6` reader - Pin A6
        pub type PA6_R = crate::BitReader;
        ///Field `PA6` writer - Pin A6
        pub type PA6_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA7` reader - Pin A7
        pub type PA7_R = crate::BitReader;
        ///Field `PA7` writer - Pin A7
        pub type PA7_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Pin A0
            #[inline(always)]
            pub fn pa0(&self) -> PA0_R {
                PA0_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Pin A1
            #[inline(always)]
            pub fn pa1(&self) -> PA1_R {
                PA1_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Pin A2
            #[inline(always)]
            pub fn pa2(&self) -> PA2_R {
                PA2_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Pin A3
            #[inline(always)]
            pub fn pa3(&self) -> PA3_R {
                PA3_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Pin A4
            #[inline(always)]
            pub fn pa4(&self) -> PA4_R {
                PA4_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Pin A5
            #[inline(always)]
            pub fn pa5(&self) -> PA5_R {
                PA5_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Pin A6
            #[inline(always)]
            pub fn pa6(&self) -> PA6_R {
                PA6_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Pin A7
            #[inline(always)]
            pub fn pa7(&self) -> PA7_R {
                PA7_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Pin A0
            #[inline(always)]
            pub fn pa0(&mut self) -> PA0_W<'_, DDRA_SPEC> {
                PA0_W::new(self, 0)
            }
            ///Bit 1 - Pin A1
            #[inline(always)]
            pub fn pa1(&mut self) -> PA1_W<'_, DDRA_SPEC> {
                PA1_W::new(self, 1)
            }
            ///Bit 2 - Pin A2
            #[inline(always)]
            pub fn pa2(&mut self) -> PA2_W<'_, DDRA_SPEC> {
                PA2_W::new(self, 2)
            }
            ///Bit 3 - Pin A3
            #[inline(always)]
            pub fn pa3(&mut self) -> PA3_W<'_, DDRA_SPEC> {
                PA3_W::new(self, 3)
            }
            ///Bit 4 - Pin A4
            #[inline(always)]
            pub fn pa4(&mut self) -> PA4_W<'_, DDRA_SPEC> {
                PA4_W::new(self, 4)
            }
            ///Bit 5 - Pin A5
            #[inline(always)]
            pub fn pa5(&mut self) -> PA5_W<'_, DDRA_SPEC> {
                PA5_W::new(self, 5)
            }
            ///Bit 6 - Pin A6
            #[inline(always)]
            pub fn pa6(&mut self) -> PA6_W<'_, DDRA_SPEC> {
                PA6_W::new(self, 6)
            }
            ///Bit 7 - Pin A7
            #[inline(always)]
            pub fn pa7(&mut self) -> PA7_W<'_, DDRA_SPEC> {
                PA7_W::new(self, 7)
            }
        }
        /**Port A Data Direction Register

You can [`read`](crate::Reg::read) this register and get [`ddra::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ddra::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct DDRA_SPEC;
        impl crate::RegisterSpec for DDRA_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`ddra::R`](R) reader structure
        impl crate::Readable for DDRA_SPEC {}
        ///`write(|w| ..)` method takes [`ddra::W`](W) writer structure
        impl crate::Writable for DDRA_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets DDRA to value 0
        impl crate::Resettable for DDRA_SPEC {}
    }
    /**PINA (rw) register accessor: Port A Input Pins

You can [`read`](crate::Reg::read) this register and get [`pina::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pina::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@pina`] module*/
    pub type PINA = crate::Reg<pina::PINA_SPEC>;
    ///Port A Input Pins
    pub mod pina {
        ///Register `PINA` reader
        pub type R = crate::R<PINA_SPEC>;
        ///Register `PINA` writer
        pub type W = crate::W<PINA_SPEC>;
        ///Field `PA0` reader - Pin A0
        pub type PA0_R = crate::BitReader;
        ///Field `PA0` writer - Pin A0
        pub type PA0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA1` reader - Pin A1
        pub type PA1_R = crate::BitReader;
        ///Field `PA1` writer - Pin A1
        pub type PA1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA2` reader - Pin A2
        pub type PA2_R = crate::BitReader;
        ///Field `PA2` writer - Pin A2
        pub type PA2_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA3` reader - Pin A3
        pub type PA3_R = crate::BitReader;
        ///Field `PA3` writer - Pin A3
        pub type PA3_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA4` reader - Pin A4
        pub type PA4_R = crate::BitReader;
        ///Field `PA4` writer - Pin A4
        pub type PA4_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA5` reader - Pin A5
        pub type PA5_R = crate::BitReader;
        ///Field `PA5` writer - Pin A5
        pub type PA5_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA6` reader - Pin A6
        pub type PA6_R = crate::BitReader;
        ///Field `PA6` writer - Pin A6
        pub type PA6_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA7` reader - Pin A7
        pub type PA7_R = crate::BitReader;
        ///Field `PA7` writer - Pin A7
        pub type PA7_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Pin A0
            #[inline(always)]
            pub fn pa0(&self) -> PA0_R {
                PA0_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Pin A1
            #[inline(always)]
            pub fn pa1(&self) -> PA1_R {
                PA1_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Pin A2
            #[inline(always)]
            pub fn pa2(&self) -> PA2_R {
                PA2_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Pin A3
            #[inline(always)]
            pub fn pa3(&self) -> PA3_R {
                PA3_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Pin A4
            #[inline(always)]
            pub fn pa4(&self) -> PA4_R {
                PA4_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Pin A5
            #[inline(always)]
            pub fn pa5(&self) -> PA5_R {
                PA5_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Pin A6
            #[inline(always)]
            pub fn pa6(&self) -> PA6_R {
                PA6_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Pin A7
            #[inline(always)]
            pub fn pa7(&self) -> PA7_R {
                PA7_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Pin A0
            #[inline(always)]
            pub fn pa0(&mut self) -> PA0_W<'_, PINA_SPEC> {
                PA0_W::new(self, 0)
            }
            ///Bit 1 - Pin A1
            #[inline(always)]
            pub fn pa1(&mut self) -> PA1_W<'_, PINA_SPEC> {
                PA1_W::new(self, 1)
            }
            ///Bit 2 - Pin A2
            #[inline(always)]
            pub fn pa2(&mut self) -> PA2_W<'_, PINA_SPEC> {
                PA2_W::new(self, 2)
            }
            ///Bit 3 - Pin A3
            #[inline(always)]
            pub fn pa3(&mut self) -> PA3_W<'_, PINA_SPEC> {
                PA3_W::new(self, 3)
            }
            ///Bit 4 - Pin A4
            #[inline(always)]
            pub fn pa4(&mut self) -> PA4_W<'_, PINA_SPEC> {
                PA4_W::new(self, 4)
            }
            ///Bit 5 - Pin A5
            #[inline(always)]
            pub fn pa5(&mut self) -> PA5_W<'_, PINA_SPEC> {
                PA5_W::new(self, 5)
            }
            ///Bit 6 - Pin A6
            #[inline(always)]
            pub fn pa6(&mut self) -> PA6_W<'_, PINA_SPEC> {
                PA6_W::new(self, 6)
            }
            ///Bit 7 - Pin A7
            #[inline(always)]
            pub fn pa7(&mut self) -> PA7_W<'_, PINA_SPEC> {
                PA7_W::new(self, 7)
            }
        }
        /**Port A Input Pins

You can [`read`](crate::Reg::read) this register and get [`pina::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pina::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct PINA_SPEC;
        impl crate::RegisterSpec for PINA_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`pina::R`](R) reader structure
        impl crate::Readable for PINA_SPEC {}
        ///`write(|w| ..)` method takes [`pina::W`](W) writer structure
        impl crate::Writable for PINA_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets PINA to value 0
        impl crate::Resettable for PINA_SPEC {}
    }
    /**PORTA (rw) register accessor: Port A Data Register

You can [`read`](crate::Reg::read) this register and get [`porta::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`porta::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@porta`] module*/
    pub type PORTA = crate::Reg<porta::PORTA_SPEC>;
    ///Port A Data Register
    pub mod porta {
        ///Register `PORTA` reader
        pub type R = crate::R<PORTA_SPEC>;
        ///Register `PORTA` writer
        pub type W = crate::W<PORTA_SPEC>;
        ///Field `PA0` reader - Pin A0
        pub type PA0_R = crate::BitReader;
        ///Field `PA0` writer - Pin A0
        pub type PA0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA1` reader - Pin A1
        pub type PA1_R = crate::BitReader;
        ///Field `PA1` writer - Pin A1
        pub type PA1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA2` reader - Pin A2
        pub type PA2_R = crate::BitReader;
        ///Field `PA2` writer - Pin A2
        pub type PA2_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA3` reader - Pin A3
        pub type PA3_R = crate::BitReader;
        ///Field `PA3` writer - Pin A3
        pub type PA3_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA4` reader - Pin A4
        pub type PA4_R = crate::BitReader;
        ///Field `PA4` writer - Pin A4
        pub type PA4_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA5` reader - Pin A5
        pub type PA5_R = crate::BitReader;
        ///Field `PA5` writer - Pin A5
        pub type PA5_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA6` reader - Pin A6
        pub type PA6_R = crate::BitReader;
        ///Field `PA6` writer - Pin A6
        pub type PA6_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PA7` reader - Pin A7
        pub type PA7_R = crate::BitReader;
        ///Field `PA7` writer - Pin A7
        pub type PA7_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Pin A0
            #[inline(always)]
            pub fn pa0(&self) -> PA0_R {
                PA0_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Pin A1
            #[inline(always)]
            pub fn pa1(&self) -> PA1_R {
                PA1_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Pin A2
            #[inline(always)]
            pub fn pa2(&self) -> PA2_R {
                PA2_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Pin A3
            #[inline(always)]
            pub fn pa3(&self) -> PA3_R {
                PA3_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Pin A4
            #[inline(always)]
            pub fn pa4(&self) -> PA4_R {
                PA4_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Pin A5
            #[inline(always)]
            pub fn pa5(&self) -> PA5_R {
                PA5_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Pin A6
            #[inline(always)]
            pub fn pa6(&self) -> PA6_R {
                PA6_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Pin A7
            #[inline(always)]
            pub fn pa7(&self) -> PA7_R {
                PA7_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Pin A0
            #[inline(always)]
            pub fn pa0(&mut self) -> PA0_W<'_, PORTA_SPEC> {
                PA0_W::new(self, 0)
            }
            ///Bit 1 - Pin A1
            #[inline(always)]
            pub fn pa1(&mut self) -> PA1_W<'_, PORTA_SPEC> {
                PA1_W::new(self, 1)
            }
            ///Bit 2 - Pin A2
            #[inline(always)]
            pub fn pa2(&mut self) -> PA2_W<'_, PORTA_SPEC> {
                PA2_W::new(self, 2)
            }
            ///Bit 3 - Pin A3
            #[inline(always)]
            pub fn pa3(&mut self) -> PA3_W<'_, PORTA_SPEC> {
                PA3_W::new(self, 3)
            }
            ///Bit 4 - Pin A4
            #[inline(always)]
            pub fn pa4(&mut self) -> PA4_W<'_, PORTA_SPEC> {
                PA4_W::new(self, 4)
            }
            ///Bit 5 - Pin A5
            #[inline(always)]
            pub fn pa5(&mut self) -> PA5_W<'_, PORTA_SPEC> {
                PA5_W::new(self, 5)
            }
            ///Bit 6 - Pin A6
            #[inline(always)]
            pub fn pa6(&mut self) -> PA6_W<'_, PORTA_SPEC> {
                PA6_W::new(self, 6)
            }
            ///Bit 7 - Pin A7
            #[inline(always)]
            pub fn pa7(&mut self) -> PA7_W<'_, PORTA_SPEC> {
                PA7_W::new(self, 7)
            }
        }
        /**Port A Data Register

You can [`read`](crate::Reg::read) this register and get [`porta::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`porta::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct PORTA_SPEC;
        impl crate::RegisterSpec for PORTA_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`porta::R`](R) reader structure
        impl crate::Readable for PORTA_SPEC {}
        ///`write(|w| ..)` method takes [`porta::W`](W) writer structure
        impl crate::Writable for PORTA_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets PORTA to value 0
        impl crate::Resettable for PORTA_SPEC {}
    }
}
///I/O Port
pub type PORTB = crate::Periph<portb::RegisterBlock, 0x36>;
impl core::fmt::Debug for PORTB {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("PORTB").finish()
    }
}
///I/O Port
pub mod portb {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        pinb: PINB,
        ddrb: DDRB,
        portb: PORTB,
    }
    impl RegisterBlock {
        ///0x00 - Port B Input Pins
        #[inline(always)]
        pub const fn pinb(&self) -> &PINB {
            &self.pinb
        }
        ///0x01 - Port B Data Direction Register
        #[inline(always)]
        pub const fn ddrb(&self) -> &DDRB {
            &self.ddrb
        }
        ///0x02 - Port B Data Register
        #[inline(always)]
        pub const fn portb(&self) -> &PORTB {
            &self.portb
        }
    }
    /**DDRB (rw) register accessor: Port B Data Direction Register

You can [`read`](crate::Reg::read) this register and get [`ddrb::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ddrb::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@ddrb`] module*/
    pub type DDRB = crate::Reg<ddrb::DDRB_SPEC>;
    ///Port B Data Direction Register
    pub mod ddrb {
        ///Register `DDRB` reader
        pub type R = crate::R<DDRB_SPEC>;
        ///Register `DDRB` writer
        pub type W = crate::W<DDRB_SPEC>;
        ///Field `PB0` reader - Pin B0
        pub type PB0_R = crate::BitReader;
        ///Field `PB0` writer - Pin B0
        pub type PB0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB1` reader - Pin B1
        pub type PB1_R = crate::BitReader;
        ///Field `PB1` writer - Pin B1
        pub type PB1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB2` reader - Pin B2
        pub type PB2_R = crate::BitReader;
        ///Field `PB2` writer - Pin B2
        pub type PB2_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB3` reader - Pin B3
        pub type PB3_R = crate::BitReader;
        ///Field `PB3` writer - Pin B3
        pub type PB3_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB4` reader - Pin B4
        pub type PB4_R = crate::BitReader;
        ///Field `PB4` writer - Pin B4
        pub type PB4_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB5` reader - Pin B5
        pub type PB5_R = crate::BitReader;
        ///Field `PB5` writer - Pin B5
        pub type PB5_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB6` reader - Pin B6
        pub type PB6_R = crate::BitReader;
        ///Field `PB6` writer - Pin B6
        pub type PB6_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB7` reader - Pin B7
        pub type PB7_R = crate::BitReader;
        ///Field `PB7` writer - Pin B7
        pub type PB7_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Pin B0
            #[inline(always)]
            pub fn pb0(&self) -> PB0_R {
                PB0_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Pin B1
            #[inline(always)]
            pub fn pb1(&self) -> PB1_R {
                PB1_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Pin B2
            #[inline(always)]
            pub fn pb2(&self) -> PB2_R {
                PB2_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Pin B3
            #[inline(always)]
            pub fn pb3(&self) -> PB3_R {
                PB3_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Pin B4
            #[inline(always)]
            pub fn pb4(&self) -> PB4_R {
                PB4_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Pin B5
            #[inline(always)]
            pub fn pb5(&self) -> PB5_R {
                PB5_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Pin B6
            #[inline(always)]
            pub fn pb6(&self) -> PB6_R {
                PB6_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Pin B7
            #[inline(always)]
            pub fn pb7(&self) -> PB7_R {
                PB7_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Pin B0
            #[inline(always)]
            pub fn pb0(&mut self) -> PB0_W<'_, DDRB_SPEC> {
                PB0_W::new(self, 0)
            }
            ///Bit 1 - Pin B1
            #[inline(always)]
            pub fn pb1(&mut self) -> PB1_W<'_, DDRB_SPEC> {
                PB1_W::new(self, 1)
            }
            ///Bit 2 - Pin B2
            #[inline(always)]
            pub fn pb2(&mut self) -> PB2_W<'_, DDRB_SPEC> {
                PB2_W::new(self, 2)
            }
            ///Bit 3 - Pin B3
            #[inline(always)]
            pub fn pb3(&mut self) -> PB3_W<'_, DDRB_SPEC> {
                PB3_W::new(self, 3)
            }
            ///Bit 4 - Pin B4
            #[inline(always)]
            pub fn pb4(&mut self) -> PB4_W<'_, DDRB_SPEC> {
                PB4_W::new(self, 4)
            }
            ///Bit 5 - Pin B5
            #[inline(always)]
            pub fn pb5(&mut self) -> PB5_W<'_, DDRB_SPEC> {
                PB5_W::new(self, 5)
            }
            ///Bit 6 - Pin B6
            #[inline(always)]
            pub fn pb6(&mut self) -> PB6_W<'_, DDRB_SPEC> {
                PB6_W::new(self, 6)
            }
            ///Bit 7 - Pin B7
            #[inline(always)]
            pub fn pb7(&mut self) -> PB7_W<'_, DDRB_SPEC> {
                PB7_W::new(self, 7)
            }
        }
        /**Port B Data Direction Register

You can [`read`](crate::Reg::read) this register and get [`ddrb::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ddrb::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct DDRB_SPEC;
        impl crate::RegisterSpec for DDRB_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`ddrb::R`](R) reader structure
        impl crate::Readable for DDRB_SPEC {}
        ///`write(|w| ..)` method takes [`ddrb::W`](W) writer structure
        impl crate::Writable for DDRB_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets DDRB to value 0
        impl crate::Resettable for DDRB_SPEC {}
    }
    /**PINB (rw) register accessor: Port B Input Pins

You can [`read`](crate::Reg::read) this register and get [`pinb::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pinb::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@pinb`] module*/
    pub type PINB = crate::Reg<pinb::PINB_SPEC>;
    ///Port B Input Pins
    pub mod pinb {
        ///Register `PINB` reader
        pub type R = crate::R<PINB_SPEC>;
        ///Register `PINB` writer
        pub type W = crate::W<PINB_SPEC>;
        ///Field `PB0` reader - Pin B0
        pub type PB0_R = crate::BitReader;
        ///Field `PB0` writer - Pin B0
        pub type PB0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB1` reader - Pin B1
        pub type PB1_R = crate::BitReader;
        ///Field `PB1` writer - Pin B1
        pub type PB1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB2` reader - Pin B2
        pub type PB2_R = crate::BitReader;
        ///Field `PB2` writer - Pin B2
        pub type PB2_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB3` reader - Pin B3
        pub type PB3_R = crate::BitReader;
        ///Field `PB3` writer - Pin B3
        pub type PB3_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB4` reader - Pin B4
        pub type PB4_R = crate::BitReader;
        ///Field `PB4` writer - Pin B4
        pub type PB4_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB5` reader - Pin B5
        pub type PB5_R = crate::BitReader;
        ///Field `PB5` writer - Pin B5
        pub type PB5_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB6` reader - Pin B6
        pub type PB6_R = crate::BitReader;
        ///Field `PB6` writer - Pin B6
        pub type PB6_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB7` reader - Pin B7
        pub type PB7_R = crate::BitReader;
        ///Field `PB7` writer - Pin B7
        pub type PB7_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Pin B0
            #[inline(always)]
            pub fn pb0(&self) -> PB0_R {
                PB0_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Pin B1
            #[inline(always)]
            pub fn pb1(&self) -> PB1_R {
                PB1_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Pin B2
            #[inline(always)]
            pub fn pb2(&self) -> PB2_R {
                PB2_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Pin B3
            #[inline(always)]
            pub fn pb3(&self) -> PB3_R {
                PB3_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Pin B4
            #[inline(always)]
            pub fn pb4(&self) -> PB4_R {
                PB4_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Pin B5
            #[inline(always)]
            pub fn pb5(&self) -> PB5_R {
                PB5_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Pin B6
            #[inline(always)]
            pub fn pb6(&self) -> PB6_R {
                PB6_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Pin B7
            #[inline(always)]
            pub fn pb7(&self) -> PB7_R {
                PB7_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Pin B0
            #[inline(always)]
            pub fn pb0(&mut self) -> PB0_W<'_, PINB_SPEC> {
                PB0_W::new(self, 0)
            }
            ///Bit 1 - Pin B1
            #[inline(always)]
            pub fn pb1(&mut self) -> PB1_W<'_, PINB_SPEC> {
                PB1_W::new(self, 1)
            }
            ///Bit 2 - Pin B2
            #[inline(always)]
            pub fn pb2(&mut self) -> PB2_W<'_, PINB_SPEC> {
                PB2_W::new(self, 2)
            }
            ///Bit 3 - Pin B3
            #[inline(always)]
            pub fn pb3(&mut self) -> PB3_W<'_, PINB_SPEC> {
                PB3_W::new(self, 3)
            }
            ///Bit 4 - Pin B4
            #[inline(always)]
            pub fn pb4(&mut self) -> PB4_W<'_, PINB_SPEC> {
                PB4_W::new(self, 4)
            }
            ///Bit 5 - Pin B5
            #[inline(always)]
            pub fn pb5(&mut self) -> PB5_W<'_, PINB_SPEC> {
                PB5_W::new(self, 5)
            }
            ///Bit 6 - Pin B6
            #[inline(always)]
            pub fn pb6(&mut self) -> PB6_W<'_, PINB_SPEC> {
                PB6_W::new(self, 6)
            }
            ///Bit 7 - Pin B7
            #[inline(always)]
            pub fn pb7(&mut self) -> PB7_W<'_, PINB_SPEC> {
                PB7_W::new(self, 7)
            }
        }
        /**Port B Input Pins

You can [`read`](crate::Reg::read) this register and get [`pinb::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`pinb::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct PINB_SPEC;
        impl crate::RegisterSpec for PINB_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`pinb::R`](R) reader structure
        impl crate::Readable for PINB_SPEC {}
        ///`write(|w| ..)` method takes [`pinb::W`](W) writer structure
        impl crate::Writable for PINB_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets PINB to value 0
        impl crate::Resettable for PINB_SPEC {}
    }
    /**PORTB (rw) register accessor: Port B Data Register

You can [`read`](crate::Reg::read) this register and get [`portb::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`portb::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@portb`] module*/
    pub type PORTB = crate::Reg<portb::PORTB_SPEC>;
    ///Port B Data Register
    pub mod portb {
        ///Register `PORTB` reader
        pub type R = crate::R<PORTB_SPEC>;
        ///Register `PORTB` writer
        pub type W = crate::W<PORTB_SPEC>;
        ///Field `PB0` reader - Pin B0
        pub type PB0_R = crate::BitReader;
        ///Field `PB0` writer - Pin B0
        pub type PB0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB1` reader - Pin B1
        pub type PB1_R = crate::BitReader;
        ///Field `PB1` writer - Pin B1
        pub type PB1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB2` reader - Pin B2
        pub type PB2_R = crate::BitReader;
        ///Field `PB2` writer - Pin B2
        pub type PB2_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB3` reader - Pin B3
        pub type PB3_R = crate::BitReader;
        ///Field `PB3` writer - Pin B3
        pub type PB3_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB4` reader - Pin B4
        pub type PB4_R = crate::BitReader;
        ///Field `PB4` writer - Pin B4
        pub type PB4_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB5` reader - Pin B5
        pub type PB5_R = crate::BitReader;
        ///Field `PB5` writer - Pin B5
        pub type PB5_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB6` reader - Pin B6
        pub type PB6_R = crate::BitReader;
        ///Field `PB6` writer - Pin B6
        pub type PB6_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PB7` reader - Pin B7
        pub type PB7_R = crate::BitReader;
        ///Field `PB7` writer - Pin B7
        pub type PB7_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Pin B0
            #[inline(always)]
            pub fn pb0(&self) -> PB0_R {
                PB0_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Pin B1
            #[inline(always)]
            pub fn pb1(&self) -> PB1_R {
                PB1_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 2 - Pin B2
            #[inline(always)]
            pub fn pb2(&self) -> PB2_R {
                PB2_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Pin B3
            #[inline(always)]
            pub fn pb3(&self) -> PB3_R {
                PB3_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Pin B4
            #[inline(always)]
            pub fn pb4(&self) -> PB4_R {
                PB4_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Pin B5
            #[inline(always)]
            pub fn pb5(&self) -> PB5_R {
                PB5_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Pin B6
            #[inline(always)]
            pub fn pb6(&self) -> PB6_R {
                PB6_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Pin B7
            #[inline(always)]
            pub fn pb7(&self) -> PB7_R {
                PB7_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Pin B0
            #[inline(always)]
            pub fn pb0(&mut self) -> PB0_W<'_, PORTB_SPEC> {
                PB0_W::new(self, 0)
            }
            ///Bit 1 - Pin B1
            #[inline(always)]
            pub fn pb1(&mut self) -> PB1_W<'_, PORTB_SPEC> {
                PB1_W::new(self, 1)
            }
            ///Bit 2 - Pin B2
            #[inline(always)]
            pub fn pb2(&mut self) -> PB2_W<'_, PORTB_SPEC> {
                PB2_W::new(self, 2)
            }
            ///Bit 3 - Pin B3
            #[inline(always)]
            pub fn pb3(&mut self) -> PB3_W<'_, PORTB_SPEC> {
                PB3_W::new(self, 3)
            }
            ///Bit 4 - Pin B4
            #[inline(always)]
            pub fn pb4(&mut self) -> PB4_W<'_, PORTB_SPEC> {
                PB4_W::new(self, 4)
            }
            ///Bit 5 - Pin B5
            #[inline(always)]
            pub fn pb5(&mut self) -> PB5_W<'_, PORTB_SPEC> {
                PB5_W::new(self, 5)
            }
            ///Bit 6 - Pin B6
            #[inline(always)]
            pub fn pb6(&mut self) -> PB6_W<'_, PORTB_SPEC> {
                PB6_W::new(self, 6)
            }
            ///Bit 7 - Pin B7
            #[inline(always)]
            pub fn pb7(&mut self) -> PB7_W<'_, PORTB_SPEC> {
                PB7_W::new(self, 7)
            }
        }
        /**Port B Data Register

You can [`read`](crate::Reg::read) this register and get [`portb::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`portb::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct PORTB_SPEC;
        impl crate::RegisterSpec for PORTB_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`portb::R`](R) reader structure
        impl crate::Readable for PORTB_SPEC {}
        ///`write(|w| ..)` method takes [`portb::W`](W) writer structure
        impl crate::Writable for PORTB_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets PORTB to value 0
        impl crate::Resettable for PORTB_SPEC {}
    }
}
///Timer/Counter0
pub type TC0 = crate::Periph<tc0::RegisterBlock, 0x32>;
impl core::fmt::Debug for TC0 {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("TC0").finish()
    }
}
///Timer/Counter0
pub mod tc0 {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        ocr0b: OCR0B,
        ocr0a: OCR0A,
        tcnt0h: TCNT0H,
        tccr0a: TCCR0A,
        _reserved4: [u8; 0x1c],
        tcnt0l: TCNT0L,
        tccr0b: TCCR0B,
        _reserved6: [u8; 0x04],
        tifr: TIFR,
        timsk: TIMSK,
    }
    impl RegisterBlock {
        ///0x00 - Timer/Counter0 Output Compare Register
        #[inline(always)]
        pub const fn ocr0b(&self) -> &OCR0B {
            &self.ocr0b
        }
        ///0x01 - Timer/Counter0 Output Compare Register
        #[inline(always)]
        pub const fn ocr0a(&self) -> &OCR0A {
            &self.ocr0a
        }
        ///0x02 - Timer/Counter0 High
        #[inline(always)]
        pub const fn tcnt0h(&self) -> &TCNT0H {
            &self.tcnt0h
        }
        ///0x03 - Timer/Counter Control Register A
        #[inline(always)]
        pub const fn tccr0a(&self) -> &TCCR0A {
            &self.tccr0a
        }
        ///0x20 - Timer/Counter0 Low
        #[inline(always)]
        pub const fn tcnt0l(&self) -> &TCNT0L {
            &self.tcnt0l
        }
        ///0x21 - Timer/Counter Control Register B
        #[inline(always)]
        pub const fn tccr0b(&self) -> &TCCR0B {
            &self.tccr0b
        }
        ///0x26 - Timer/Counter0 Interrupt Flag register
        #[inline(always)]
        pub const fn tifr(&self) -> &TIFR {
            &self.tifr
        }
        ///0x27 - Timer/Counter Interrupt Mask Register
        #[inline(always)]
        pub const fn timsk(&self) -> &TIMSK {
            &self.timsk
        }
    }
    /**OCR0A (rw) register accessor: Timer/Counter0 Output Compare Register

You can [`read`](crate::Reg::read) this register and get [`ocr0a::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr0a::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@ocr0a`] module*/
    pub type OCR0A = crate::Reg<ocr0a::OCR0A_SPEC>;
    ///Timer/Counter0 Output Compare Register
    pub mod ocr0a {
        ///Register `OCR0A` reader
        pub type R = crate::R<OCR0A_SPEC>;
        ///Register `OCR0A` writer
        pub type W = crate::W<OCR0A_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Timer/Counter0 Output Compare Register

You can [`read`](crate::Reg::read) this register and get [`ocr0a::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr0a::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct OCR0A_SPEC;
        impl crate::RegisterSpec for OCR0A_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`ocr0a::R`](R) reader structure
        impl crate::Readable for OCR0A_SPEC {}
        ///`write(|w| ..)` method takes [`ocr0a::W`](W) writer structure
        impl crate::Writable for OCR0A_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets OCR0A to value 0
        impl crate::Resettable for OCR0A_SPEC {}
    }
    /**OCR0B (rw) register accessor: Timer/Counter0 Output Compare Register

You can [`read`](crate::Reg::read) this register and get [`ocr0b::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr0b::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@ocr0b`] module*/
    pub type OCR0B = crate::Reg<ocr0b::OCR0B_SPEC>;
    ///Timer/Counter0 Output Compare Register
    pub mod ocr0b {
        ///Register `OCR0B` reader
        pub type R = crate::R<OCR0B_SPEC>;
        ///Register `OCR0B` writer
        pub type W = crate::W<OCR0B_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Timer/Counter0 Output Compare Register

You can [`read`](crate::Reg::read) this register and get [`ocr0b::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr0b::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct OCR0B_SPEC;
        impl crate::RegisterSpec for OCR0B_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`ocr0b::R`](R) reader structure
        impl crate::Readable for OCR0B_SPEC {}
        ///`write(|w| ..)` method takes [`ocr0b::W`](W) writer structure
        impl crate::Writable for OCR0B_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets OCR0B to value 0
        impl crate::Resettable for OCR0B_SPEC {}
    }
    /**TCCR0A (rw) register accessor: Timer/Counter Control Register A

You can [`read`](crate::Reg::read) this register and get [`tccr0a::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr0a::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tccr0a`] module*/
    pub type TCCR0A = crate::Reg<tccr0a::TCCR0A_SPEC>;
    ///Timer/Counter Control Register A
    pub mod tccr0a {
        ///Register `TCCR0A` reader
        pub type R = crate::R<TCCR0A_SPEC>;
        ///Register `TCCR0A` writer
        pub type W = crate::W<TCCR0A_SPEC>;
        ///Field `CTC0` reader - Waveform Generation Mode
        pub type CTC0_R = crate::BitReader;
        ///Field `CTC0` writer - Waveform Generation Mode
        pub type CTC0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ACIC0` reader - Analog Comparator Input Capture Enable
        pub type ACIC0_R = crate::BitReader;
        ///Field `ACIC0` writer - Analog Comparator Input Capture Enable
        pub type ACIC0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ICES0` reader - Input Capture Edge Select
        pub type ICES0_R = crate::BitReader;
        ///Field `ICES0` writer - Input Capture Edge Select
        pub type ICES0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ICNC0` reader - Input Capture Noice Canceler
        pub type ICNC0_R = crate::BitReader;
        ///Field `ICNC0` writer - Input Capture Noice Canceler
        pub type ICNC0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `ICEN0` reader - Input Capture Mode Enable
        pub type ICEN0_R = crate::BitReader;
        ///Field `ICEN0` writer - Input Capture Mode Enable
        pub type ICEN0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `TCW0` reader - Timer/Counter 0 Width
        pub type TCW0_R = crate::BitReader;
        ///Field `TCW0` writer - Timer/Counter 0 Width
        pub type TCW0_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Waveform Generation Mode
            #[inline(always)]
            pub fn ctc0(&self) -> CTC0_R {
                CTC0_R::new((self.bits & 1) != 0)
            }
            ///Bit 3 - Analog Comparator Input Capture Enable
            #[inline(always)]
            pub fn acic0(&self) -> ACIC0_R {
                ACIC0_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Input Capture Edge Select
            #[inline(always)]
            pub fn ices0(&self) -> ICES0_R {
                ICES0_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Input Capture Noice Canceler
            #[inline(always)]
            pub fn icnc0(&self) -> ICNC0_R {
                ICNC0_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Input Capture Mode Enable
            #[inline(always)]
            pub fn icen0(&self) -> ICEN0_R {
                ICEN0_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Timer/Counter 0 Width
            #[inline(always)]
            pub fn tcw0(&self) -> TCW0_R {
                TCW0_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Waveform Generation Mode
            #[inline(always)]
            pub fn ctc0(&mut self) -> CTC0_W<'_, TCCR0A_SPEC> {
                CTC0_W::new(self, 0)
            }
            ///Bit 3 - Analog Comparator Input Capture Enable
            #[inline(always)]
            pub fn acic0(&mut self) -> ACIC0_W<'_, TCCR0A_SPEC> {
                ACIC0_W::new(self, 3)
            }
            ///Bit 4 - Input Capture Edge Select
            #[inline(always)]
            pub fn ices0(&mut self) -> ICES0_W<'_, TCCR0A_SPEC> {
                ICES0_W::new(self, 4)
            }
            ///Bit 5 - Input Capture Noice Canceler
            #[inline(always)]
            pub fn icnc0(&mut self) -> ICNC0_W<'_, TCCR0A_SPEC> {
                ICNC0_W::new(self, 5)
            }
            ///Bit 6 - Input Capture Mode Enable
            #[inline(always)]
            pub fn icen0(&mut self) -> ICEN0_W<'_, TCCR0A_SPEC> {
                ICEN0_W::new(self, 6)
            }
            ///Bit 7 - Timer/Counter 0 Width
            #[inline(always)]
            pub fn tcw0(&mut self) -> TCW0_W<'_, TCCR0A_SPEC> {
                TCW0_W::new(self, 7)
            }
        }
        /**Timer/Counter Control Register A

You can [`read`](crate::Reg::read) this register and get [`tccr0a::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr0a::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCCR0A_SPEC;
        impl crate::RegisterSpec for TCCR0A_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tccr0a::R`](R) reader structure
        impl crate::Readable for TCCR0A_SPEC {}
        ///`write(|w| ..)` method takes [`tccr0a::W`](W) writer structure
        impl crate::Writable for TCCR0A_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TCCR0A to value 0
        impl crate::Resettable for TCCR0A_SPEC {}
    }
    /**TCCR0B (rw) register accessor: Timer/Counter Control Register B

You can [`read`](crate::Reg::read) this register and get [`tccr0b::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr0b::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tccr0b`] module*/
    pub type TCCR0B = crate::Reg<tccr0b::TCCR0B_SPEC>;
    ///Timer/Counter Control Register B
    pub mod tccr0b {
        ///Register `TCCR0B` reader
        pub type R = crate::R<TCCR0B_SPEC>;
        ///Register `TCCR0B` writer
        pub type W = crate::W<TCCR0B_SPEC>;
        /**Clock Select

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum CS0_A {
            ///0: No clock source (Timer/Counter stopped)
            NO_CLOCK = 0,
            ///1: Running, No Prescaling
            DIRECT = 1,
            ///2: Running, CLK/8
            PRESCALE_8 = 2,
            ///3: Running, CLK/64
            PRESCALE_64 = 3,
            ///4: Running, CLK/256
            PRESCALE_256 = 4,
            ///5: Running, CLK/1024
            PRESCALE_1024 = 5,
            ///6: Running, ExtClk Tx Falling Edge
            EXT_FALLING = 6,
            ///7: Running, ExtClk Tx Rising Edge
            EXT_RISING = 7,
        }
        impl From<CS0_A> for u8 {
            #[inline(always)]
            fn from(variant: CS0_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for CS0_A {
            type Ux = u8;
        }
        impl crate::IsEnum for CS0_A {}
        ///Field `CS0` reader - Clock Select
        pub type CS0_R = crate::FieldReader<CS0_A>;
        impl CS0_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> CS0_A {
                match self.bits {
                    0 => CS0_A::NO_CLOCK,
                    1 => CS0_A::DIRECT,
                    2 => CS0_A::PRESCALE_8,
                    3 => CS0_A::PRESCALE_64,
                    4 => CS0_A::PRESCALE_256,
                    5 => CS0_A::PRESCALE_1024,
                    6 => CS0_A::EXT_FALLING,
                    7 => CS0_A::EXT_RISING,
                    _ => unreachable!(),
                }
            }
            ///No clock source (Timer/Counter stopped)
            #[inline(always)]
            pub fn is_no_clock(&self) -> bool {
                *self == CS0_A::NO_CLOCK
            }
            ///Running, No Prescaling
            #[inline(always)]
            pub fn is_direct(&self) -> bool {
                *self == CS0_A::DIRECT
            }
            ///Running, CLK/8
            #[inline(always)]
            pub fn is_prescale_8(&self) -> bool {
                *self == CS0_A::PRESCALE_8
            }
            ///Running, CLK/64
            #[inline(always)]
            pub fn is_prescale_64(&self) -> bool {
                *self == CS0_A::PRESCALE_64
            }
            ///Running, CLK/256
            #[inline(always)]
            pub fn is_prescale_256(&self) -> bool {
                *self == CS0_A::PRESCALE_256
            }
            ///Running, CLK/1024
            #[inline(always)]
            pub fn is_prescale_1024(&self) -> bool {
                *self == CS0_A::PRESCALE_1024
            }
            ///Running, ExtClk Tx Falling Edge
            #[inline(always)]
            pub fn is_ext_falling(&self) -> bool {
                *self == CS0_A::EXT_FALLING
            }
            ///Running, ExtClk Tx Rising Edge
            #[inline(always)]
            pub fn is_ext_rising(&self) -> bool {
                *self == CS0_A::EXT_RISING
            }
        }
        ///Field `CS0` writer - Clock Select
        pub type CS0_W<'a, REG> = crate::FieldWriter<'a, REG, 3, CS0_A, crate::Safe>;
        impl<'a, REG> CS0_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///No clock source (Timer/Counter stopped)
            #[inline(always)]
            pub fn no_clock(self) -> &'a mut crate::W<REG> {
                self.variant(CS0_A::NO_CLOCK)
            }
            ///Running, No Prescaling
            #[inline(always)]
            pub fn direct(self) -> &'a mut crate::W<REG> {
                self.variant(CS0_A::DIRECT)
            }
            ///Running, CLK/8
            #[inline(always)]
            pub fn prescale_8(self) -> &'a mut crate::W<REG> {
                self.variant(CS0_A::PRESCALE_8)
            }
            ///Running, CLK/64
            #[inline(always)]
            pub fn prescale_64(self) -> &'a mut crate::W<REG> {
                self.variant(CS0_A::PRESCALE_64)
            }
            ///Running, CLK/256
            #[inline(always)]
            pub fn prescale_256(self) -> &'a mut crate::W<REG> {
                self.variant(CS0_A::PRESCALE_256)
            }
            ///Running, CLK/1024
            #[inline(always)]
            pub fn prescale_1024(self) -> &'a mut crate::W<REG> {
                self.variant(CS0_A::PRESCALE_1024)
            }
            ///Running, ExtClk Tx Falling Edge
            #[inline(always)]
            pub fn ext_falling(self) -> &'a mut crate::W<REG> {
                self.variant(CS0_A::EXT_FALLING)
            }
            ///Running, ExtClk Tx Rising Edge
            #[inline(always)]
            pub fn ext_rising(self) -> &'a mut crate::W<REG> {
                self.variant(CS0_A::EXT_RISING)
            }
        }
        ///Field `PSR0` reader - Timer/Counter 0 Prescaler Reset
        pub type PSR0_R = crate::BitReader;
        ///Field `PSR0` writer - Timer/Counter 0 Prescaler Reset
        pub type PSR0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `TSM` reader - Timer/Counter Synchronization Mode
        pub type TSM_R = crate::BitReader;
        ///Field `TSM` writer - Timer/Counter Synchronization Mode
        pub type TSM_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:2 - Clock Select
            #[inline(always)]
            pub fn cs0(&self) -> CS0_R {
                CS0_R::new(self.bits & 7)
            }
            ///Bit 3 - Timer/Counter 0 Prescaler Reset
            #[inline(always)]
            pub fn psr0(&self) -> PSR0_R {
                PSR0_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Timer/Counter Synchronization Mode
            #[inline(always)]
            pub fn tsm(&self) -> TSM_R {
                TSM_R::new(((self.bits >> 4) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:2 - Clock Select
            #[inline(always)]
            pub fn cs0(&mut self) -> CS0_W<'_, TCCR0B_SPEC> {
                CS0_W::new(self, 0)
            }
            ///Bit 3 - Timer/Counter 0 Prescaler Reset
            #[inline(always)]
            pub fn psr0(&mut self) -> PSR0_W<'_, TCCR0B_SPEC> {
                PSR0_W::new(self, 3)
            }
            ///Bit 4 - Timer/Counter Synchronization Mode
            #[inline(always)]
            pub fn tsm(&mut self) -> TSM_W<'_, TCCR0B_SPEC> {
                TSM_W::new(self, 4)
            }
        }
        /**Timer/Counter Control Register B

You can [`read`](crate::Reg::read) this register and get [`tccr0b::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr0b::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCCR0B_SPEC;
        impl crate::RegisterSpec for TCCR0B_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tccr0b::R`](R) reader structure
        impl crate::Readable for TCCR0B_SPEC {}
        ///`write(|w| ..)` method takes [`tccr0b::W`](W) writer structure
        impl crate::Writable for TCCR0B_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TCCR0B to value 0
        impl crate::Resettable for TCCR0B_SPEC {}
    }
    /**TCNT0H (rw) register accessor: Timer/Counter0 High

You can [`read`](crate::Reg::read) this register and get [`tcnt0h::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tcnt0h::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tcnt0h`] module*/
    pub type TCNT0H = crate::Reg<tcnt0h::TCNT0H_SPEC>;
    ///Timer/Counter0 High
    pub mod tcnt0h {
        ///Register `TCNT0H` reader
        pub type R = crate::R<TCNT0H_SPEC>;
        ///Register `TCNT0H` writer
        pub type W = crate::W<TCNT0H_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Timer/Counter0 High

You can [`read`](crate::Reg::read) this register and get [`tcnt0h::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tcnt0h::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCNT0H_SPEC;
        impl crate::RegisterSpec for TCNT0H_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tcnt0h::R`](R) reader structure
        impl crate::Readable for TCNT0H_SPEC {}
        ///`write(|w| ..)` method takes [`tcnt0h::W`](W) writer structure
        impl crate::Writable for TCNT0H_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets TCNT0H to value 0
        impl crate::Resettable for TCNT0H_SPEC {}
    }
    /**TCNT0L (rw) register accessor: Timer/Counter0 Low

You can [`read`](crate::Reg::read) this register and get [`tcnt0l::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tcnt0l::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tcnt0l`] module*/
    pub type TCNT0L = crate::Reg<tcnt0l::TCNT0L_SPEC>;
    ///Timer/Counter0 Low
    pub mod tcnt0l {
        ///Register `TCNT0L` reader
        pub type R = crate::R<TCNT0L_SPEC>;
        ///Register `TCNT0L` writer
        pub type W = crate::W<TCNT0L_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Timer/Counter0 Low

You can [`read`](crate::Reg::read) this register and get [`tcnt0l::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tcnt0l::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCNT0L_SPEC;
        impl crate::RegisterSpec for TCNT0L_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tcnt0l::R`](R) reader structure
        impl crate::Readable for TCNT0L_SPEC {}
        ///`write(|w| ..)` method takes [`tcnt0l::W`](W) writer structure
        impl crate::Writable for TCNT0L_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets TCNT0L to value 0
        impl crate::Resettable for TCNT0L_SPEC {}
    }
    /**TIFR (rw) register accessor: Timer/Counter0 Interrupt Flag register

You can [`read`](crate::Reg::read) this register and get [`tifr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tifr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tifr`] module*/
    pub type TIFR = crate::Reg<tifr::TIFR_SPEC>;
    ///Timer/Counter0 Interrupt Flag register
    pub mod tifr {
        ///Register `TIFR` reader
        pub type R = crate::R<TIFR_SPEC>;
        ///Register `TIFR` writer
        pub type W = crate::W<TIFR_SPEC>;
        ///Field `ICF0` reader - Timer/Counter0 Input Capture Flag
        pub type ICF0_R = crate::BitReader;
        ///Field `ICF0` writer - Timer/Counter0 Input Capture Flag
        pub type ICF0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `TOV0` reader - Timer/Counter0 Overflow Flag
        pub type TOV0_R = crate::BitReader;
        ///Field `TOV0` writer - Timer/Counter0 Overflow Flag
        pub type TOV0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCF0B` reader - Timer/Counter0 Output Compare Flag 0B
        pub type OCF0B_R = crate::BitReader;
        ///Field `OCF0B` writer - Timer/Counter0 Output Compare Flag 0B
        pub type OCF0B_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCF0A` reader - Timer/Counter0 Output Compare Flag 0A
        pub type OCF0A_R = crate::BitReader;
        ///Field `OCF0A` writer - Timer/Counter0 Output Compare Flag 0A
        pub type OCF0A_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Timer/Counter0 Input Capture Flag
            #[inline(always)]
            pub fn icf0(&self) -> ICF0_R {
                ICF0_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Timer/Counter0 Overflow Flag
            #[inline(always)]
            pub fn tov0(&self) -> TOV0_R {
                TOV0_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 3 - Timer/Counter0 Output Compare Flag 0B
            #[inline(always)]
            pub fn ocf0b(&self) -> OCF0B_R {
                OCF0B_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Timer/Counter0 Output Compare Flag 0A
            #[inline(always)]
            pub fn ocf0a(&self) -> OCF0A_R {
                OCF0A_R::new(((self.bits >> 4) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Timer/Counter0 Input Capture Flag
            #[inline(always)]
            pub fn icf0(&mut self) -> ICF0_W<'_, TIFR_SPEC> {
                ICF0_W::new(self, 0)
            }
            ///Bit 1 - Timer/Counter0 Overflow Flag
            #[inline(always)]
            pub fn tov0(&mut self) -> TOV0_W<'_, TIFR_SPEC> {
                TOV0_W::new(self, 1)
            }
            ///Bit 3 - Timer/Counter0 Output Compare Flag 0B
            #[inline(always)]
            pub fn ocf0b(&mut self) -> OCF0B_W<'_, TIFR_SPEC> {
                OCF0B_W::new(self, 3)
            }
            ///Bit 4 - Timer/Counter0 Output Compare Flag 0A
            #[inline(always)]
            pub fn ocf0a(&mut self) -> OCF0A_W<'_, TIFR_SPEC> {
                OCF0A_W::new(self, 4)
            }
        }
        /**Timer/Counter0 Interrupt Flag register

You can [`read`](crate::Reg::read) this register and get [`tifr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tifr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TIFR_SPEC;
        impl crate::RegisterSpec for TIFR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tifr::R`](R) reader structure
        impl crate::Readable for TIFR_SPEC {}
        ///`write(|w| ..)` method takes [`tifr::W`](W) writer structure
        impl crate::Writable for TIFR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TIFR to value 0
        impl crate::Resettable for TIFR_SPEC {}
    }
    /**TIMSK (rw) register accessor: Timer/Counter Interrupt Mask Register

You can [`read`](crate::Reg::read) this register and get [`timsk::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`timsk::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@timsk`] module*/
    pub type TIMSK = crate::Reg<timsk::TIMSK_SPEC>;
    ///Timer/Counter Interrupt Mask Register
    pub mod timsk {
        ///Register `TIMSK` reader
        pub type R = crate::R<TIMSK_SPEC>;
        ///Register `TIMSK` writer
        pub type W = crate::W<TIMSK_SPEC>;
        ///Field `TICIE0` reader - Timer/Counter0 Input Capture Interrupt Enable
        pub type TICIE0_R = crate::BitReader;
        ///Field `TICIE0` writer - Timer/Counter0 Input Capture Interrupt Enable
        pub type TICIE0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `TOIE0` reader - Timer/Counter0 Overflow Interrupt Enable
        pub type TOIE0_R = crate::BitReader;
        ///Field `TOIE0` writer - Timer/Counter0 Overflow Interrupt Enable
        pub type TOIE0_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCIE0B` reader - Timer/Counter0 Output Compare Match B Interrupt Enable
        pub type OCIE0B_R = crate::BitReader;
        ///Field `OCIE0B` writer - Timer/Counter0 Output Compare Match B Interrupt Enable
        pub type OCIE0B_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCIE0A` reader - Timer/Counter0 Output Compare Match A Interrupt Enable
        pub type OCIE0A_R = crate::BitReader;
        ///Field `OCIE0A` writer - Timer/Counter0 Output Compare Match A Interrupt Enable
        pub type OCIE0A_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Timer/Counter0 Input Capture Interrupt Enable
            #[inline(always)]
            pub fn ticie0(&self) -> TICIE0_R {
                TICIE0_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Timer/Counter0 Overflow Interrupt Enable
            #[inline(always)]
            pub fn toie0(&self) -> TOIE0_R {
                TOIE0_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bit 3 - Timer/Counter0 Output Compare Match B Interrupt Enable
            #[inline(always)]
            pub fn ocie0b(&self) -> OCIE0B_R {
                OCIE0B_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Timer/Counter0 Output Compare Match A Interrupt Enable
            #[inline(always)]
            pub fn ocie0a(&self) -> OCIE0A_R {
                OCIE0A_R::new(((self.bits >> 4) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Timer/Counter0 Input Capture Interrupt Enable
            #[inline(always)]
            pub fn ticie0(&mut self) -> TICIE0_W<'_, TIMSK_SPEC> {
                TICIE0_W::new(self, 0)
            }
            ///Bit 1 - Timer/Counter0 Overflow Interrupt Enable
            #[inline(always)]
            pub fn toie0(&mut self) -> TOIE0_W<'_, TIMSK_SPEC> {
                TOIE0_W::new(self, 1)
            }
            ///Bit 3 - Timer/Counter0 Output Compare Match B Interrupt Enable
            #[inline(always)]
            pub fn ocie0b(&mut self) -> OCIE0B_W<'_, TIMSK_SPEC> {
                OCIE0B_W::new(self, 3)
            }
            ///Bit 4 - Timer/Counter0 Output Compare Match A Interrupt Enable
            #[inline(always)]
            pub fn ocie0a(&mut self) -> OCIE0A_W<'_, TIMSK_SPEC> {
                OCIE0A_W::new(self, 4)
            }
        }
        /**Timer/Counter Interrupt Mask Register

You can [`read`](crate::Reg::read) this register and get [`timsk::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`timsk::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TIMSK_SPEC;
        impl crate::RegisterSpec for TIMSK_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`timsk::R`](R) reader structure
        impl crate::Readable for TIMSK_SPEC {}
        ///`write(|w| ..)` method takes [`timsk::W`](W) writer structure
        impl crate::Writable for TIMSK_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TIMSK to value 0
        impl crate::Resettable for TIMSK_SPEC {}
    }
}
///Timer/Counter1, 10-bit
pub type TC1 = crate::Periph<tc1::RegisterBlock, 0x20>;
impl core::fmt::Debug for TC1 {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("TC1").finish()
    }
}
///Timer/Counter1, 10-bit
pub mod tc1 {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        tccr1e: TCCR1E,
        _reserved1: [u8; 0x23],
        dt1: DT1,
        tc1h: TC1H,
        tccr1d: TCCR1D,
        tccr1c: TCCR1C,
        _reserved5: [u8; 0x02],
        ocr1d: OCR1D,
        ocr1c: OCR1C,
        ocr1b: OCR1B,
        ocr1a: OCR1A,
        tcnt1: TCNT1,
        tccr1b: TCCR1B,
        tccr1a: TCCR1A,
        _reserved12: [u8; 0x07],
        tifr: TIFR,
        timsk: TIMSK,
    }
    impl RegisterBlock {
        ///0x00 - Timer/Counter1 Control Register E
        #[inline(always)]
        pub const fn tccr1e(&self) -> &TCCR1E {
            &self.tccr1e
        }
        ///0x24 - Timer/Counter 1 Dead Time Value
        #[inline(always)]
        pub const fn dt1(&self) -> &DT1 {
            &self.dt1
        }
        ///0x25 - Timer/Counter High Bits
        #[inline(always)]
        pub const fn tc1h(&self) -> &TC1H {
            &self.tc1h
        }
        ///0x26 - Timer/Counter Control Register D
        #[inline(always)]
        pub const fn tccr1d(&self) -> &TCCR1D {
            &self.tccr1d
        }
        ///0x27 - Timer/Counter Control Register C
        #[inline(always)]
        pub const fn tccr1c(&self) -> &TCCR1C {
            &self.tccr1c
        }
        ///0x2a - Output compare register
        #[inline(always)]
        pub const fn ocr1d(&self) -> &OCR1D {
            &self.ocr1d
        }
        ///0x2b - Output compare register
        #[inline(always)]
        pub const fn ocr1c(&self) -> &OCR1C {
            &self.ocr1c
        }
        ///0x2c - Output Compare Register
        #[inline(always)]
        pub const fn ocr1b(&self) -> &OCR1B {
            &self.ocr1b
        }
        ///0x2d - Output Compare Register
        #[inline(always)]
        pub const fn ocr1a(&self) -> &OCR1A {
            &self.ocr1a
        }
        ///0x2e - Timer/Counter Register
        #[inline(always)]
        pub const fn tcnt1(&self) -> &TCNT1 {
            &self.tcnt1
        }
        ///0x2f - Timer/Counter Control Register B
        #[inline(always)]
        pub const fn tccr1b(&self) -> &TCCR1B {
            &self.tccr1b
        }
        ///0x30 - Timer/Counter Control Register A
        #[inline(always)]
        pub const fn tccr1a(&self) -> &TCCR1A {
            &self.tccr1a
        }
        ///0x38 - Timer/Counter Interrupt Flag Register
        #[inline(always)]
        pub const fn tifr(&self) -> &TIFR {
            &self.tifr
        }
        ///0x39 - Timer/Counter Interrupt Mask Register
        #[inline(always)]
        pub const fn timsk(&self) -> &TIMSK {
            &self.timsk
        }
    }
    /**DT1 (rw) register accessor: Timer/Counter 1 Dead Time Value

You can [`read`](crate::Reg::read) this register and get [`dt1::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`dt1::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@dt1`] module*/
    pub type DT1 = crate::Reg<dt1::DT1_SPEC>;
    ///Timer/Counter 1 Dead Time Value
    pub mod dt1 {
        ///Register `DT1` reader
        pub type R = crate::R<DT1_SPEC>;
        ///Register `DT1` writer
        pub type W = crate::W<DT1_SPEC>;
        ///Field `DT1L` reader - No Description.
        pub type DT1L_R = crate::FieldReader;
        ///Field `DT1L` writer - No Description.
        pub type DT1L_W<'a, REG> = crate::FieldWriter<'a, REG, 4, u8, crate::Safe>;
        ///Field `DT1H` reader - No Description.
        pub type DT1H_R = crate::FieldReader;
        ///Field `DT1H` writer - No Description.
        pub type DT1H_W<'a, REG> = crate::FieldWriter<'a, REG, 4, u8, crate::Safe>;
        impl R {
            ///Bits 0:3 - No Description.
            #[inline(always)]
            pub fn dt1l(&self) -> DT1L_R {
                DT1L_R::new(self.bits & 0x0f)
            }
            ///Bits 4:7 - No Description.
            #[inline(always)]
            pub fn dt1h(&self) -> DT1H_R {
                DT1H_R::new((self.bits >> 4) & 0x0f)
            }
        }
        impl W {
            ///Bits 0:3 - No Description.
            #[inline(always)]
            pub fn dt1l(&mut self) -> DT1L_W<'_, DT1_SPEC> {
                DT1L_W::new(self, 0)
            }
            ///Bits 4:7 - No Description.
            #[inline(always)]
            pub fn dt1h(&mut self) -> DT1H_W<'_, DT1_SPEC> {
                DT1H_W::new(self, 4)
            }
        }
        /**Timer/Counter 1 Dead Time Value

You can [`read`](crate::Reg::read) this register and get [`dt1::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`dt1::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct DT1_SPEC;
        impl crate::RegisterSpec for DT1_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`dt1::R`](R) reader structure
        impl crate::Readable for DT1_SPEC {}
        ///`write(|w| ..)` method takes [`dt1::W`](W) writer structure
        impl crate::Writable for DT1_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets DT1 to value 0
        impl crate::Resettable for DT1_SPEC {}
    }
    /**OCR1A (rw) register accessor: Output Compare Register

You can [`read`](crate::Reg::read) this register and get [`ocr1a::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr1a::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@ocr1a`] module*/
    pub type OCR1A = crate::Reg<ocr1a::OCR1A_SPEC>;
    ///Output Compare Register
    pub mod ocr1a {
        ///Register `OCR1A` reader
        pub type R = crate::R<OCR1A_SPEC>;
        ///Register `OCR1A` writer
        pub type W = crate::W<OCR1A_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Output Compare Register

You can [`read`](crate::Reg::read) this register and get [`ocr1a::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr1a::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct OCR1A_SPEC;
        impl crate::RegisterSpec for OCR1A_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`ocr1a::R`](R) reader structure
        impl crate::Readable for OCR1A_SPEC {}
        ///`write(|w| ..)` method takes [`ocr1a::W`](W) writer structure
        impl crate::Writable for OCR1A_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets OCR1A to value 0
        impl crate::Resettable for OCR1A_SPEC {}
    }
    /**OCR1B (rw) register accessor: Output Compare Register

You can [`read`](crate::Reg::read) this register and get [`ocr1b::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr1b::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@ocr1b`] module*/
    pub type OCR1B = crate::Reg<ocr1b::OCR1B_SPEC>;
    ///Output Compare Register
    pub mod ocr1b {
        ///Register `OCR1B` reader
        pub type R = crate::R<OCR1B_SPEC>;
        ///Register `OCR1B` writer
        pub type W = crate::W<OCR1B_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Output Compare Register

You can [`read`](crate::Reg::read) this register and get [`ocr1b::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr1b::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct OCR1B_SPEC;
        impl crate::RegisterSpec for OCR1B_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`ocr1b::R`](R) reader structure
        impl crate::Readable for OCR1B_SPEC {}
        ///`write(|w| ..)` method takes [`ocr1b::W`](W) writer structure
        impl crate::Writable for OCR1B_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets OCR1B to value 0
        impl crate::Resettable for OCR1B_SPEC {}
    }
    /**OCR1C (rw) register accessor: Output compare register

You can [`read`](crate::Reg::read) this register and get [`ocr1c::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr1c::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@ocr1c`] module*/
    pub type OCR1C = crate::Reg<ocr1c::OCR1C_SPEC>;
    ///Output compare register
    pub mod ocr1c {
        ///Register `OCR1C` reader
        pub type R = crate::R<OCR1C_SPEC>;
        ///Register `OCR1C` writer
        pub type W = crate::W<OCR1C_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Output compare register

You can [`read`](crate::Reg::read) this register and get [`ocr1c::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr1c::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct OCR1C_SPEC;
        impl crate::RegisterSpec for OCR1C_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`ocr1c::R`](R) reader structure
        impl crate::Readable for OCR1C_SPEC {}
        ///`write(|w| ..)` method takes [`ocr1c::W`](W) writer structure
        impl crate::Writable for OCR1C_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets OCR1C to value 0
        impl crate::Resettable for OCR1C_SPEC {}
    }
    /**OCR1D (rw) register accessor: Output compare register

You can [`read`](crate::Reg::read) this register and get [`ocr1d::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr1d::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@ocr1d`] module*/
    pub type OCR1D = crate::Reg<ocr1d::OCR1D_SPEC>;
    ///Output compare register
    pub mod ocr1d {
        ///Register `OCR1D` reader
        pub type R = crate::R<OCR1D_SPEC>;
        ///Register `OCR1D` writer
        pub type W = crate::W<OCR1D_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Output compare register

You can [`read`](crate::Reg::read) this register and get [`ocr1d::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`ocr1d::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct OCR1D_SPEC;
        impl crate::RegisterSpec for OCR1D_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`ocr1d::R`](R) reader structure
        impl crate::Readable for OCR1D_SPEC {}
        ///`write(|w| ..)` method takes [`ocr1d::W`](W) writer structure
        impl crate::Writable for OCR1D_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets OCR1D to value 0
        impl crate::Resettable for OCR1D_SPEC {}
    }
    /**TC1H (rw) register accessor: Timer/Counter High Bits

You can [`read`](crate::Reg::read) this register and get [`tc1h::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tc1h::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tc1h`] module*/
    pub type TC1H = crate::Reg<tc1h::TC1H_SPEC>;
    ///Timer/Counter High Bits
    pub mod tc1h {
        ///Register `TC1H` reader
        pub type R = crate::R<TC1H_SPEC>;
        ///Register `TC1H` writer
        pub type W = crate::W<TC1H_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Timer/Counter High Bits

You can [`read`](crate::Reg::read) this register and get [`tc1h::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tc1h::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TC1H_SPEC;
        impl crate::RegisterSpec for TC1H_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tc1h::R`](R) reader structure
        impl crate::Readable for TC1H_SPEC {}
        ///`write(|w| ..)` method takes [`tc1h::W`](W) writer structure
        impl crate::Writable for TC1H_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets TC1H to value 0
        impl crate::Resettable for TC1H_SPEC {}
    }
    /**TCCR1A (rw) register accessor: Timer/Counter Control Register A

You can [`read`](crate::Reg::read) this register and get [`tccr1a::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1a::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tccr1a`] module*/
    pub type TCCR1A = crate::Reg<tccr1a::TCCR1A_SPEC>;
    ///Timer/Counter Control Register A
    pub mod tccr1a {
        ///Register `TCCR1A` reader
        pub type R = crate::R<TCCR1A_SPEC>;
        ///Register `TCCR1A` writer
        pub type W = crate::W<TCCR1A_SPEC>;
        ///Field `PWM1B` reader - Pulse Width Modulator Enable
        pub type PWM1B_R = crate::BitReader;
        ///Field `PWM1B` writer - Pulse Width Modulator Enable
        pub type PWM1B_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PWM1A` reader - Pulse Width Modulator Enable
        pub type PWM1A_R = crate::BitReader;
        ///Field `PWM1A` writer - Pulse Width Modulator Enable
        pub type PWM1A_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `FOC1B` writer - Force Output Compare Match 1B
        pub type FOC1B_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `FOC1A` writer - Force Output Compare Match 1A
        pub type FOC1A_W<'a, REG> = crate::BitWriter<'a, REG>;
        /**Compare Output Mode, Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum COM1B_A {
            ///0: Normal port operation, OCix disconnected
            DISCONNECTED = 0,
            ///1: Toggle OCix on Compare Match (Might depend on WGM)
            MATCH_TOGGLE = 1,
            ///2: Clear OCix on Compare Match (If PWM is enabled, OCix is set at TOP)
            MATCH_CLEAR = 2,
            ///3: Set OCix on Compare Match (If PWM is enabled, OCix is cleared at TOP)
            MATCH_SET = 3,
        }
        impl From<COM1B_A> for u8 {
            #[inline(always)]
            fn from(variant: COM1B_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for COM1B_A {
            type Ux = u8;
        }
        impl crate::IsEnum for COM1B_A {}
        ///Field `COM1B` reader - Compare Output Mode, Bits
        pub type COM1B_R = crate::FieldReader<COM1B_A>;
        impl COM1B_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> COM1B_A {
                match self.bits {
                    0 => COM1B_A::DISCONNECTED,
                    1 => COM1B_A::MATCH_TOGGLE,
                    2 => COM1B_A::MATCH_CLEAR,
                    3 => COM1B_A::MATCH_SET,
                    _ => unreachable!(),
                }
            }
            ///Normal port operation, OCix disconnected
            #[inline(always)]
            pub fn is_disconnected(&self) -> bool {
                *self == COM1B_A::DISCONNECTED
            }
            ///Toggle OCix on Compare Match (Might depend on WGM)
            #[inline(always)]
            pub fn is_match_toggle(&self) -> bool {
                *self == COM1B_A::MATCH_TOGGLE
            }
            ///Clear OCix on Compare Match (If PWM is enabled, OCix is set at TOP)
            #[inline(always)]
            pub fn is_match_clear(&self) -> bool {
                *self == COM1B_A::MATCH_CLEAR
            }
            ///Set OCix on Compare Match (If PWM is enabled, OCix is cleared at TOP)
            #[inline(always)]
            pub fn is_match_set(&self) -> bool {
                *self == COM1B_A::MATCH_SET
            }
        }
        ///Field `COM1B` writer - Compare Output Mode, Bits
        pub type COM1B_W<'a, REG> = crate::FieldWriter<'a, REG, 2, COM1B_A, crate::Safe>;
        impl<'a, REG> COM1B_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Normal port operation, OCix disconnected
            #[inline(always)]
            pub fn disconnected(self) -> &'a mut crate::W<REG> {
                self.variant(COM1B_A::DISCONNECTED)
            }
            ///Toggle OCix on Compare Match (Might depend on WGM)
            #[inline(always)]
            pub fn match_toggle(self) -> &'a mut crate::W<REG> {
                self.variant(COM1B_A::MATCH_TOGGLE)
            }
            ///Clear OCix on Compare Match (If PWM is enabled, OCix is set at TOP)
            #[inline(always)]
            pub fn match_clear(self) -> &'a mut crate::W<REG> {
                self.variant(COM1B_A::MATCH_CLEAR)
            }
            ///Set OCix on Compare Match (If PWM is enabled, OCix is cleared at TOP)
            #[inline(always)]
            pub fn match_set(self) -> &'a mut crate::W<REG> {
                self.variant(COM1B_A::MATCH_SET)
            }
        }
        ///Field `COM1A` reader - Compare Output Mode, Bits
        pub use COM1B_R as COM1A_R;
        ///Field `COM1A` writer - Compare Output Mode, Bits
        pub use COM1B_W as COM1A_W;
        impl R {
            ///Bit 0 - Pulse Width Modulator Enable
            #[inline(always)]
            pub fn pwm1b(&self) -> PWM1B_R {
                PWM1B_R::new((self.bits & 1) != 0)
            }
            ///Bit 1 - Pulse Width Modulator Enable
            #[inline(always)]
            pub fn pwm1a(&self) -> PWM1A_R {
                PWM1A_R::new(((self.bits >> 1) & 1) != 0)
            }
            ///Bits 4:5 - Compare Output Mode, Bits
            #[inline(always)]
            pub fn com1b(&self) -> COM1B_R {
                COM1B_R::new((self.bits >> 4) & 3)
            }
            ///Bits 6:7 - Compare Output Mode, Bits
            #[inline(always)]
            pub fn com1a(&self) -> COM1A_R {
                COM1A_R::new((self.bits >> 6) & 3)
            }
        }
        impl W {
            ///Bit 0 - Pulse Width Modulator Enable
            #[inline(always)]
            pub fn pwm1b(&mut self) -> PWM1B_W<'_, TCCR1A_SPEC> {
                PWM1B_W::new(self, 0)
            }
            ///Bit 1 - Pulse Width Modulator Enable
            #[inline(always)]
            pub fn pwm1a(&mut self) -> PWM1A_W<'_, TCCR1A_SPEC> {
                PWM1A_W::new(self, 1)
            }
            ///Bit 2 - Force Output Compare Match 1B
            #[inline(always)]
            pub fn foc1b(&mut self) -> FOC1B_W<'_, TCCR1A_SPEC> {
                FOC1B_W::new(self, 2)
            }
            ///Bit 3 - Force Output Compare Match 1A
            #[inline(always)]
            pub fn foc1a(&mut self) -> FOC1A_W<'_, TCCR1A_SPEC> {
                FOC1A_W::new(self, 3)
            }
            ///Bits 4:5 - Compare Output Mode, Bits
            #[inline(always)]
            pub fn com1b(&mut self) -> COM1B_W<'_, TCCR1A_SPEC> {
                COM1B_W::new(self, 4)
            }
            ///Bits 6:7 - Compare Output Mode, Bits
            #[inline(always)]
            pub fn com1a(&mut self) -> COM1A_W<'_, TCCR1A_SPEC> {
                COM1A_W::new(self, 6)
            }
        }
        /**Timer/Counter Control Register A

You can [`read`](crate::Reg::read) this register and get [`tccr1a::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1a::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCCR1A_SPEC;
        impl crate::RegisterSpec for TCCR1A_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tccr1a::R`](R) reader structure
        impl crate::Readable for TCCR1A_SPEC {}
        ///`write(|w| ..)` method takes [`tccr1a::W`](W) writer structure
        impl crate::Writable for TCCR1A_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TCCR1A to value 0
        impl crate::Resettable for TCCR1A_SPEC {}
    }
    /**TCCR1B (rw) register accessor: Timer/Counter Control Register B

You can [`read`](crate::Reg::read) this register and get [`tccr1b::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1b::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tccr1b`] module*/
    pub type TCCR1B = crate::Reg<tccr1b::TCCR1B_SPEC>;
    ///Timer/Counter Control Register B
    pub mod tccr1b {
        ///Register `TCCR1B` reader
        pub type R = crate::R<TCCR1B_SPEC>;
        ///Register `TCCR1B` writer
        pub type W = crate::W<TCCR1B_SPEC>;
        /**Clock Select Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum CS1_A {
            ///0: No clock source (Timer/Counter stopped)
            NO_CLOCK = 0,
            ///1: Running, No Prescaling
            DIRECT = 1,
            ///2: Running, CLK/2
            PRESCALE_2 = 2,
            ///3: Running, CLK/4
            PRESCALE_4 = 3,
            ///4: Running, CLK/8
            PRESCALE_8 = 4,
            ///5: Running, CLK/16
            PRESCALE_16 = 5,
            ///6: Running, CLK/32
            PRESCALE_32 = 6,
            ///7: Running, CLK/64
            PRESCALE_64 = 7,
            ///8: Running, CLK/128
            PRESCALE_128 = 8,
            ///9: Running, CLK/256
            PRESCALE_256 = 9,
            ///10: Running, CLK/512
            PRESCALE_512 = 10,
            ///11: Running, CLK/1024
            PRESCALE_1024 = 11,
            ///12: Running, CLK/2048
            PRESCALE_2048 = 12,
            ///13: Running, CLK/4096
            PRESCALE_4096 = 13,
            ///14: Running, CLK/8192
            PRESCALE_8192 = 14,
            ///15: Running, CLK/16384
            PRESCALE_16384 = 15,
        }
        impl From<CS1_A> for u8 {
            #[inline(always)]
            fn from(variant: CS1_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for CS1_A {
            type Ux = u8;
        }
        impl crate::IsEnum for CS1_A {}
        ///Field `CS1` reader - Clock Select Bits
        pub type CS1_R = crate::FieldReader<CS1_A>;
        impl CS1_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> CS1_A {
                match self.bits {
                    0 => CS1_A::NO_CLOCK,
                    1 => CS1_A::DIRECT,
                    2 => CS1_A::PRESCALE_2,
                    3 => CS1_A::PRESCALE_4,
                    4 => CS1_A::PRESCALE_8,
                    5 => CS1_A::PRESCALE_16,
                    6 => CS1_A::PRESCALE_32,
                    7 => CS1_A::PRESCALE_64,
                    8 => CS1_A::PRESCALE_128,
                    9 => CS1_A::PRESCALE_256,
                    10 => CS1_A::PRESCALE_512,
                    11 => CS1_A::PRESCALE_1024,
                    12 => CS1_A::PRESCALE_2048,
                    13 => CS1_A::PRESCALE_4096,
                    14 => CS1_A::PRESCALE_8192,
                    15 => CS1_A::PRESCALE_16384,
                    _ => unreachable!(),
                }
            }
            ///No clock source (Timer/Counter stopped)
            #[inline(always)]
            pub fn is_no_clock(&self) -> bool {
                *self == CS1_A::NO_CLOCK
            }
            ///Running, No Prescaling
            #[inline(always)]
            pub fn is_direct(&self) -> bool {
                *self == CS1_A::DIRECT
            }
            ///Running, CLK/2
            #[inline(always)]
            pub fn is_prescale_2(&self) -> bool {
                *self == CS1_A::PRESCALE_2
            }
            ///Running, CLK/4
            #[inline(always)]
            pub fn is_prescale_4(&self) -> bool {
                *self == CS1_A::PRESCALE_4
            }
            ///Running, CLK/8
            #[inline(always)]
            pub fn is_prescale_8(&self) -> bool {
                *self == CS1_A::PRESCALE_8
            }
            ///Running, CLK/16
            #[inline(always)]
            pub fn is_prescale_16(&self) -> bool {
                *self == CS1_A::PRESCALE_16
            }
            ///Running, CLK/32
            #[inline(always)]
            pub fn is_prescale_32(&self) -> bool {
                *self == CS1_A::PRESCALE_32
            }
            ///Running, CLK/64
            #[inline(always)]
            pub fn is_prescale_64(&self) -> bool {
                *self == CS1_A::PRESCALE_64
            }
            ///Running, CLK/128
            #[inline(always)]
            pub fn is_prescale_128(&self) -> bool {
                *self == CS1_A::PRESCALE_128
            }
            ///Running, CLK/256
            #[inline(always)]
            pub fn is_prescale_256(&self) -> bool {
                *self == CS1_A::PRESCALE_256
            }
            ///Running, CLK/512
            #[inline(always)]
            pub fn is_prescale_512(&self) -> bool {
                *self == CS1_A::PRESCALE_512
            }
            ///Running, CLK/1024
            #[inline(always)]
            pub fn is_prescale_1024(&self) -> bool {
                *self == CS1_A::PRESCALE_1024
            }
            ///Running, CLK/2048
            #[inline(always)]
            pub fn is_prescale_2048(&self) -> bool {
                *self == CS1_A::PRESCALE_2048
            }
            ///Running, CLK/4096
            #[inline(always)]
            pub fn is_prescale_4096(&self) -> bool {
                *self == CS1_A::PRESCALE_4096
            }
            ///Running, CLK/8192
            #[inline(always)]
            pub fn is_prescale_8192(&self) -> bool {
                *self == CS1_A::PRESCALE_8192
            }
            ///Running, CLK/16384
            #[inline(always)]
            pub fn is_prescale_16384(&self) -> bool {
                *self == CS1_A::PRESCALE_16384
            }
        }
        ///Field `CS1` writer - Clock Select Bits
        pub type CS1_W<'a, REG> = crate::FieldWriter<'a, REG, 4, CS1_A, crate::Safe>;
        impl<'a, REG> CS1_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///No clock source (Timer/Counter stopped)
            #[inline(always)]
            pub fn no_clock(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::NO_CLOCK)
            }
            ///Running, No Prescaling
            #[inline(always)]
            pub fn direct(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::DIRECT)
            }
            ///Running, CLK/2
            #[inline(always)]
            pub fn prescale_2(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_2)
            }
            ///Running, CLK/4
            #[inline(always)]
            pub fn prescale_4(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_4)
            }
            ///Running, CLK/8
            #[inline(always)]
            pub fn prescale_8(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_8)
            }
            ///Running, CLK/16
            #[inline(always)]
            pub fn prescale_16(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_16)
            }
            ///Running, CLK/32
            #[inline(always)]
            pub fn prescale_32(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_32)
            }
            ///Running, CLK/64
            #[inline(always)]
            pub fn prescale_64(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_64)
            }
            ///Running, CLK/128
            #[inline(always)]
            pub fn prescale_128(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_128)
            }
            ///Running, CLK/256
            #[inline(always)]
            pub fn prescale_256(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_256)
            }
            ///Running, CLK/512
            #[inline(always)]
            pub fn prescale_512(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_512)
            }
            ///Running, CLK/1024
            #[inline(always)]
            pub fn prescale_1024(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_1024)
            }
            ///Running, CLK/2048
            #[inline(always)]
            pub fn prescale_2048(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_2048)
            }
            ///Running, CLK/4096
            #[inline(always)]
            pub fn prescale_4096(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_4096)
            }
            ///Running, CLK/8192
            #[inline(always)]
            pub fn prescale_8192(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_8192)
            }
            ///Running, CLK/16384
            #[inline(always)]
            pub fn prescale_16384(self) -> &'a mut crate::W<REG> {
                self.variant(CS1_A::PRESCALE_16384)
            }
        }
        /**Dead Time Prescaler

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum DTPS1_A {
            ///0: 1x (no division)
            X1 = 0,
            ///1: 2x
            X2 = 1,
            ///2: 4x
            X4 = 2,
            ///3: 8x
            X8 = 3,
        }
        impl From<DTPS1_A> for u8 {
            #[inline(always)]
            fn from(variant: DTPS1_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for DTPS1_A {
            type Ux = u8;
        }
        impl crate::IsEnum for DTPS1_A {}
        ///Field `DTPS1` reader - Dead Time Prescaler
        pub type DTPS1_R = crate::FieldReader<DTPS1_A>;
        impl DTPS1_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> DTPS1_A {
                match self.bits {
                    0 => DTPS1_A::X1,
                    1 => DTPS1_A::X2,
                    2 => DTPS1_A::X4,
                    3 => DTPS1_A::X8,
                    _ => unreachable!(),
                }
            }
            ///1x (no division)
            #[inline(always)]
            pub fn is_x1(&self) -> bool {
                *self == DTPS1_A::X1
            }
            ///2x
            #[inline(always)]
            pub fn is_x2(&self) -> bool {
                *self == DTPS1_A::X2
            }
            ///4x
            #[inline(always)]
            pub fn is_x4(&self) -> bool {
                *self == DTPS1_A::X4
            }
            ///8x
            #[inline(always)]
            pub fn is_x8(&self) -> bool {
                *self == DTPS1_A::X8
            }
        }
        ///Field `DTPS1` writer - Dead Time Prescaler
        pub type DTPS1_W<'a, REG> = crate::FieldWriter<'a, REG, 2, DTPS1_A, crate::Safe>;
        impl<'a, REG> DTPS1_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///1x (no division)
            #[inline(always)]
            pub fn x1(self) -> &'a mut crate::W<REG> {
                self.variant(DTPS1_A::X1)
            }
            ///2x
            #[inline(always)]
            pub fn x2(self) -> &'a mut crate::W<REG> {
                self.variant(DTPS1_A::X2)
            }
            ///4x
            #[inline(always)]
            pub fn x4(self) -> &'a mut crate::W<REG> {
                self.variant(DTPS1_A::X4)
            }
            ///8x
            #[inline(always)]
            pub fn x8(self) -> &'a mut crate::W<REG> {
                self.variant(DTPS1_A::X8)
            }
        }
        ///Field `PSR1` reader - Timer/Counter 1 Prescaler reset
        pub type PSR1_R = crate::BitReader;
        ///Field `PSR1` writer - Timer/Counter 1 Prescaler reset
        pub type PSR1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `PWM1X` reader - PWM Inversion Mode
        pub type PWM1X_R = crate::BitReader;
        ///Field `PWM1X` writer - PWM Inversion Mode
        pub type PWM1X_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:3 - Clock Select Bits
            #[inline(always)]
            pub fn cs1(&self) -> CS1_R {
                CS1_R::new(self.bits & 0x0f)
            }
            ///Bits 4:5 - Dead Time Prescaler
            #[inline(always)]
            pub fn dtps1(&self) -> DTPS1_R {
                DTPS1_R::new((self.bits >> 4) & 3)
            }
            ///Bit 6 - Timer/Counter 1 Prescaler reset
            #[inline(always)]
            pub fn psr1(&self) -> PSR1_R {
                PSR1_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - PWM Inversion Mode
            #[inline(always)]
            pub fn pwm1x(&self) -> PWM1X_R {
                PWM1X_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:3 - Clock Select Bits
            #[inline(always)]
            pub fn cs1(&mut self) -> CS1_W<'_, TCCR1B_SPEC> {
                CS1_W::new(self, 0)
            }
            ///Bits 4:5 - Dead Time Prescaler
            #[inline(always)]
            pub fn dtps1(&mut self) -> DTPS1_W<'_, TCCR1B_SPEC> {
                DTPS1_W::new(self, 4)
            }
            ///Bit 6 - Timer/Counter 1 Prescaler reset
            #[inline(always)]
            pub fn psr1(&mut self) -> PSR1_W<'_, TCCR1B_SPEC> {
                PSR1_W::new(self, 6)
            }
            ///Bit 7 - PWM Inversion Mode
            #[inline(always)]
            pub fn pwm1x(&mut self) -> PWM1X_W<'_, TCCR1B_SPEC> {
                PWM1X_W::new(self, 7)
            }
        }
        /**Timer/Counter Control Register B

You can [`read`](crate::Reg::read) this register and get [`tccr1b::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1b::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCCR1B_SPEC;
        impl crate::RegisterSpec for TCCR1B_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tccr1b::R`](R) reader structure
        impl crate::Readable for TCCR1B_SPEC {}
        ///`write(|w| ..)` method takes [`tccr1b::W`](W) writer structure
        impl crate::Writable for TCCR1B_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TCCR1B to value 0
        impl crate::Resettable for TCCR1B_SPEC {}
    }
    /**TCCR1C (rw) register accessor: Timer/Counter Control Register C

You can [`read`](crate::Reg::read) this register and get [`tccr1c::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1c::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tccr1c`] module*/
    pub type TCCR1C = crate::Reg<tccr1c::TCCR1C_SPEC>;
    ///Timer/Counter Control Register C
    pub mod tccr1c {
        ///Register `TCCR1C` reader
        pub type R = crate::R<TCCR1C_SPEC>;
        ///Register `TCCR1C` writer
        pub type W = crate::W<TCCR1C_SPEC>;
        ///Field `PWM1D` reader - Pulse Width Modulator D Enable
        pub type PWM1D_R = crate::BitReader;
        ///Field `PWM1D` writer - Pulse Width Modulator D Enable
        pub type PWM1D_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `FOC1D` writer - Force Output Compare Match 1D
        pub type FOC1D_W<'a, REG> = crate::BitWriter<'a, REG>;
        /**Comparator D output mode

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum COM1D_A {
            ///0: Normal port operation, OCix disconnected
            DISCONNECTED = 0,
            ///1: Toggle OCix on Compare Match (Might depend on WGM)
            MATCH_TOGGLE = 1,
            ///2: Clear OCix on Compare Match (If PWM is enabled, OCix is set at TOP)
            MATCH_CLEAR = 2,
            ///3: Set OCix on Compare Match (If PWM is enabled, OCix is cleared at TOP)
            MATCH_SET = 3,
        }
        impl From<COM1D_A> for u8 {
            #[inline(always)]
            fn from(variant: COM1D_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for COM1D_A {
            type Ux = u8;
        }
        impl crate::IsEnum for COM1D_A {}
        ///Field `COM1D` reader - Comparator D output mode
        pub type COM1D_R = crate::FieldReader<COM1D_A>;
        impl COM1D_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> COM1D_A {
                match self.bits {
                    0 => COM1D_A::DISCONNECTED,
                    1 => COM1D_A::MATCH_TOGGLE,
                    2 => COM1D_A::MATCH_CLEAR,
                    3 => COM1D_A::MATCH_SET,
                    _ => unreachable!(),
                }
            }
            ///Normal port operation, OCix disconnected
            #[inline(always)]
            pub fn is_disconnected(&self) -> bool {
                *self == COM1D_A::DISCONNECTED
            }
            ///Toggle OCix on Compare Match (Might depend on WGM)
            #[inline(always)]
            pub fn is_match_toggle(&self) -> bool {
                *self == COM1D_A::MATCH_TOGGLE
            }
            ///Clear OCix on Compare Match (If PWM is enabled, OCix is set at TOP)
            #[inline(always)]
            pub fn is_match_clear(&self) -> bool {
                *self == COM1D_A::MATCH_CLEAR
            }
            ///Set OCix on Compare Match (If PWM is enabled, OCix is cleared at TOP)
            #[inline(always)]
            pub fn is_match_set(&self) -> bool {
                *self == COM1D_A::MATCH_SET
            }
        }
        ///Field `COM1D` writer - Comparator D output mode
        pub type COM1D_W<'a, REG> = crate::FieldWriter<'a, REG, 2, COM1D_A, crate::Safe>;
        impl<'a, REG> COM1D_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Normal port operation, OCix disconnected
            #[inline(always)]
            pub fn disconnected(self) -> &'a mut crate::W<REG> {
                self.variant(COM1D_A::DISCONNECTED)
            }
            ///Toggle OCix on Compare Match (Might depend on WGM)
            #[inline(always)]
            pub fn match_toggle(self) -> &'a mut crate::W<REG> {
                self.variant(COM1D_A::MATCH_TOGGLE)
            }
            ///Clear OCix on Compare Match (If PWM is enabled, OCix is set at TOP)
            #[inline(always)]
            pub fn match_clear(self) -> &'a mut crate::W<REG> {
                self.variant(COM1D_A::MATCH_CLEAR)
            }
            ///Set OCix on Compare Match (If PWM is enabled, OCix is cleared at TOP)
            #[inline(always)]
            pub fn match_set(self) -> &'a mut crate::W<REG> {
                self.variant(COM1D_A::MATCH_SET)
            }
        }
        ///Field `COM1B0S` reader - COM1B0 Shadow Bit
        pub type COM1B0S_R = crate::BitReader;
        ///Field `COM1B0S` writer - COM1B0 Shadow Bit
        pub type COM1B0S_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `COM1B1S` reader - COM1B1 Shadow Bit
        pub type COM1B1S_R = crate::BitReader;
        ///Field `COM1B1S` writer - COM1B1 Shadow Bit
        pub type COM1B1S_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `COM1A0S` reader - COM1A0 Shadow Bit
        pub type COM1A0S_R = crate::BitReader;
        ///Field `COM1A0S` writer - COM1A0 Shadow Bit
        pub type COM1A0S_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `COM1A1S` reader - COM1A1 Shadow Bit
        pub type COM1A1S_R = crate::BitReader;
        ///Field `COM1A1S` writer - COM1A1 Shadow Bit
        pub type COM1A1S_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 0 - Pulse Width Modulator D Enable
            #[inline(always)]
            pub fn pwm1d(&self) -> PWM1D_R {
                PWM1D_R::new((self.bits & 1) != 0)
            }
            ///Bits 2:3 - Comparator D output mode
            #[inline(always)]
            pub fn com1d(&self) -> COM1D_R {
                COM1D_R::new((self.bits >> 2) & 3)
            }
            ///Bit 4 - COM1B0 Shadow Bit
            #[inline(always)]
            pub fn com1b0s(&self) -> COM1B0S_R {
                COM1B0S_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - COM1B1 Shadow Bit
            #[inline(always)]
            pub fn com1b1s(&self) -> COM1B1S_R {
                COM1B1S_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - COM1A0 Shadow Bit
            #[inline(always)]
            pub fn com1a0s(&self) -> COM1A0S_R {
                COM1A0S_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - COM1A1 Shadow Bit
            #[inline(always)]
            pub fn com1a1s(&self) -> COM1A1S_R {
                COM1A1S_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Pulse Width Modulator D Enable
            #[inline(always)]
            pub fn pwm1d(&mut self) -> PWM1D_W<'_, TCCR1C_SPEC> {
                PWM1D_W::new(self, 0)
            }
            ///Bit 1 - Force Output Compare Match 1D
            #[inline(always)]
            pub fn foc1d(&mut self) -> FOC1D_W<'_, TCCR1C_SPEC> {
                FOC1D_W::new(self, 1)
            }
            ///Bits 2:3 - Comparator D output mode
            #[inline(always)]
            pub fn com1d(&mut self) -> COM1D_W<'_, TCCR1C_SPEC> {
                COM1D_W::new(self, 2)
            }
            ///Bit 4 - COM1B0 Shadow Bit
            #[inline(always)]
            pub fn com1b0s(&mut self) -> COM1B0S_W<'_, TCCR1C_SPEC> {
                COM1B0S_W::new(self, 4)
            }
            ///Bit 5 - COM1B1 Shadow Bit
            #[inline(always)]
            pub fn com1b1s(&mut self) -> COM1B1S_W<'_, TCCR1C_SPEC> {
                COM1B1S_W::new(self, 5)
            }
            ///Bit 6 - COM1A0 Shadow Bit
            #[inline(always)]
            pub fn com1a0s(&mut self) -> COM1A0S_W<'_, TCCR1C_SPEC> {
                COM1A0S_W::new(self, 6)
            }
            ///Bit 7 - COM1A1 Shadow Bit
            #[inline(always)]
            pub fn com1a1s(&mut self) -> COM1A1S_W<'_, TCCR1C_SPEC> {
                COM1A1S_W::new(self, 7)
            }
        }
        /**Timer/Counter Control Register C

You can [`read`](crate::Reg::read) this register and get [`tccr1c::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1c::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCCR1C_SPEC;
        impl crate::RegisterSpec for TCCR1C_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tccr1c::R`](R) reader structure
        impl crate::Readable for TCCR1C_SPEC {}
        ///`write(|w| ..)` method takes [`tccr1c::W`](W) writer structure
        impl crate::Writable for TCCR1C_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TCCR1C to value 0
        impl crate::Resettable for TCCR1C_SPEC {}
    }
    /**TCCR1D (rw) register accessor: Timer/Counter Control Register D

You can [`read`](crate::Reg::read) this register and get [`tccr1d::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1d::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tccr1d`] module*/
    pub type TCCR1D = crate::Reg<tccr1d::TCCR1D_SPEC>;
    ///Timer/Counter Control Register D
    pub mod tccr1d {
        ///Register `TCCR1D` reader
        pub type R = crate::R<TCCR1D_SPEC>;
        ///Register `TCCR1D` writer
        pub type W = crate::W<TCCR1D_SPEC>;
        /**Waveform Generation Mode Bit

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum WGM1_A {
            ///0: Fast PWM, Update: *TOP*, Flag: *TOP*
            PWM_FAST = 0,
            ///1: Phase and Frequency Correct PWM, Update: *BOTTOM*, Flag: *BOTTOM*
            PWM_CORRECT = 1,
            ///2: PWM6 / Single-slope, Update: *TOP*, Flag: *TOP*
            PWM_SINGLE_SLOPE = 2,
            ///3: PWM6 / Dual-slope, Update: *BOTTOM*, Flag: *BOTTOM*
            PWM_DUAL_SLOPE = 3,
        }
        impl From<WGM1_A> for u8 {
            #[inline(always)]
            fn from(variant: WGM1_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for WGM1_A {
            type Ux = u8;
        }
        impl crate::IsEnum for WGM1_A {}
        ///Field `WGM1` reader - Waveform Generation Mode Bit
        pub type WGM1_R = crate::FieldReader<WGM1_A>;
        impl WGM1_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> WGM1_A {
                match self.bits {
                    0 => WGM1_A::PWM_FAST,
                    1 => WGM1_A::PWM_CORRECT,
                    2 => WGM1_A::PWM_SINGLE_SLOPE,
                    3 => WGM1_A::PWM_DUAL_SLOPE,
                    _ => unreachable!(),
                }
            }
            ///Fast PWM, Update: *TOP*, Flag: *TOP*
            #[inline(always)]
            pub fn is_pwm_fast(&self) -> bool {
                *self == WGM1_A::PWM_FAST
            }
            ///Phase and Frequency Correct PWM, Update: *BOTTOM*, Flag: *BOTTOM*
            #[inline(always)]
            pub fn is_pwm_correct(&self) -> bool {
                *self == WGM1_A::PWM_CORRECT
            }
            ///PWM6 / Single-slope, Update: *TOP*, Flag: *TOP*
            #[inline(always)]
            pub fn is_pwm_single_slope(&self) -> bool {
                *self == WGM1_A::PWM_SINGLE_SLOPE
            }
            ///PWM6 / Dual-slope, Update: *BOTTOM*, Flag: *BOTTOM*
            #[inline(always)]
            pub fn is_pwm_dual_slope(&self) -> bool {
                *self == WGM1_A::PWM_DUAL_SLOPE
            }
        }
        ///Field `WGM1` writer - Waveform Generation Mode Bit
        pub type WGM1_W<'a, REG> = crate::FieldWriter<'a, REG, 2, WGM1_A, crate::Safe>;
        impl<'a, REG> WGM1_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///Fast PWM, Update: *TOP*, Flag: *TOP*
            #[inline(always)]
            pub fn pwm_fast(self) -> &'a mut crate::W<REG> {
                self.variant(WGM1_A::PWM_FAST)
            }
            ///Phase and Frequency Correct PWM, Update: *BOTTOM*, Flag: *BOTTOM*
            #[inline(always)]
            pub fn pwm_correct(self) -> &'a mut crate::W<REG> {
                self.variant(WGM1_A::PWM_CORRECT)
            }
            ///PWM6 / Single-slope, Update: *TOP*, Flag: *TOP*
            #[inline(always)]
            pub fn pwm_single_slope(self) -> &'a mut crate::W<REG> {
                self.variant(WGM1_A::PWM_SINGLE_SLOPE)
            }
            ///PWM6 / Dual-slope, Update: *BOTTOM*, Flag: *BOTTOM*
            #[inline(always)]
            pub fn pwm_dual_slope(self) -> &'a mut crate::W<REG> {
                self.variant(WGM1_A::PWM_DUAL_SLOPE)
            }
        }
        ///Field `FPF1` reader - Fault Protection Interrupt Flag
        pub type FPF1_R = crate::BitReader;
        ///Field `FPF1` writer - Fault Protection Interrupt Flag
        pub type FPF1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `FPAC1` reader - Fault Protection Analog Comparator Enable
        pub type FPAC1_R = crate::BitReader;
        ///Field `FPAC1` writer - Fault Protection Analog Comparator Enable
        pub type FPAC1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `FPES1` reader - Fault Protection Edge Select
        pub type FPES1_R = crate::BitReader;
        ///Field `FPES1` writer - Fault Protection Edge Select
        pub type FPES1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `FPNC1` reader - Fault Protection Noise Canceler
        pub type FPNC1_R = crate::BitReader;
        ///Field `FPNC1` writer - Fault Protection Noise Canceler
        pub type FPNC1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `FPEN1` reader - Fault Protection Mode Enable
        pub type FPEN1_R = crate::BitReader;
        ///Field `FPEN1` writer - Fault Protection Mode Enable
        pub type FPEN1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `FPIE1` reader - Fault Protection Interrupt Enable
        pub type FPIE1_R = crate::BitReader;
        ///Field `FPIE1` writer - Fault Protection Interrupt Enable
        pub type FPIE1_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:1 - Waveform Generation Mode Bit
            #[inline(always)]
            pub fn wgm1(&self) -> WGM1_R {
                WGM1_R::new(self.bits & 3)
            }
            ///Bit 2 - Fault Protection Interrupt Flag
            #[inline(always)]
            pub fn fpf1(&self) -> FPF1_R {
                FPF1_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 3 - Fault Protection Analog Comparator Enable
            #[inline(always)]
            pub fn fpac1(&self) -> FPAC1_R {
                FPAC1_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Fault Protection Edge Select
            #[inline(always)]
            pub fn fpes1(&self) -> FPES1_R {
                FPES1_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Fault Protection Noise Canceler
            #[inline(always)]
            pub fn fpnc1(&self) -> FPNC1_R {
                FPNC1_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Fault Protection Mode Enable
            #[inline(always)]
            pub fn fpen1(&self) -> FPEN1_R {
                FPEN1_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Fault Protection Interrupt Enable
            #[inline(always)]
            pub fn fpie1(&self) -> FPIE1_R {
                FPIE1_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:1 - Waveform Generation Mode Bit
            #[inline(always)]
            pub fn wgm1(&mut self) -> WGM1_W<'_, TCCR1D_SPEC> {
                WGM1_W::new(self, 0)
            }
            ///Bit 2 - Fault Protection Interrupt Flag
            #[inline(always)]
            pub fn fpf1(&mut self) -> FPF1_W<'_, TCCR1D_SPEC> {
                FPF1_W::new(self, 2)
            }
            ///Bit 3 - Fault Protection Analog Comparator Enable
            #[inline(always)]
            pub fn fpac1(&mut self) -> FPAC1_W<'_, TCCR1D_SPEC> {
                FPAC1_W::new(self, 3)
            }
            ///Bit 4 - Fault Protection Edge Select
            #[inline(always)]
            pub fn fpes1(&mut self) -> FPES1_W<'_, TCCR1D_SPEC> {
                FPES1_W::new(self, 4)
            }
            ///Bit 5 - Fault Protection Noise Canceler
            #[inline(always)]
            pub fn fpnc1(&mut self) -> FPNC1_W<'_, TCCR1D_SPEC> {
                FPNC1_W::new(self, 5)
            }
            ///Bit 6 - Fault Protection Mode Enable
            #[inline(always)]
            pub fn fpen1(&mut self) -> FPEN1_W<'_, TCCR1D_SPEC> {
                FPEN1_W::new(self, 6)
            }
            ///Bit 7 - Fault Protection Interrupt Enable
            #[inline(always)]
            pub fn fpie1(&mut self) -> FPIE1_W<'_, TCCR1D_SPEC> {
                FPIE1_W::new(self, 7)
            }
        }
        /**Timer/Counter Control Register D

You can [`read`](crate::Reg::read) this register and get [`tccr1d::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1d::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCCR1D_SPEC;
        impl crate::RegisterSpec for TCCR1D_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tccr1d::R`](R) reader structure
        impl crate::Readable for TCCR1D_SPEC {}
        ///`write(|w| ..)` method takes [`tccr1d::W`](W) writer structure
        impl crate::Writable for TCCR1D_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TCCR1D to value 0
        impl crate::Resettable for TCCR1D_SPEC {}
    }
    /**TCCR1E (rw) register accessor: Timer/Counter1 Control Register E

You can [`read`](crate::Reg::read) this register and get [`tccr1e::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1e::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tccr1e`] module*/
    pub type TCCR1E = crate::Reg<tccr1e::TCCR1E_SPEC>;
    ///Timer/Counter1 Control Register E
    pub mod tccr1e {
        ///Register `TCCR1E` reader
        pub type R = crate::R<TCCR1E_SPEC>;
        ///Register `TCCR1E` writer
        pub type W = crate::W<TCCR1E_SPEC>;
        ///Field `OC1OE` reader - Ouput Compare Override Enable Bits
        pub type OC1OE_R = crate::FieldReader;
        ///Field `OC1OE` writer - Ouput Compare Override Enable Bits
        pub type OC1OE_W<'a, REG> = crate::FieldWriter<'a, REG, 6, u8, crate::Safe>;
        impl R {
            ///Bits 0:5 - Ouput Compare Override Enable Bits
            #[inline(always)]
            pub fn oc1oe(&self) -> OC1OE_R {
                OC1OE_R::new(self.bits & 0x3f)
            }
        }
        impl W {
            ///Bits 0:5 - Ouput Compare Override Enable Bits
            #[inline(always)]
            pub fn oc1oe(&mut self) -> OC1OE_W<'_, TCCR1E_SPEC> {
                OC1OE_W::new(self, 0)
            }
        }
        /**Timer/Counter1 Control Register E

You can [`read`](crate::Reg::read) this register and get [`tccr1e::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tccr1e::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCCR1E_SPEC;
        impl crate::RegisterSpec for TCCR1E_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tccr1e::R`](R) reader structure
        impl crate::Readable for TCCR1E_SPEC {}
        ///`write(|w| ..)` method takes [`tccr1e::W`](W) writer structure
        impl crate::Writable for TCCR1E_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TCCR1E to value 0
        impl crate::Resettable for TCCR1E_SPEC {}
    }
    /**TCNT1 (rw) register accessor: Timer/Counter Register

You can [`read`](crate::Reg::read) this register and get [`tcnt1::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tcnt1::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tcnt1`] module*/
    pub type TCNT1 = crate::Reg<tcnt1::TCNT1_SPEC>;
    ///Timer/Counter Register
    pub mod tcnt1 {
        ///Register `TCNT1` reader
        pub type R = crate::R<TCNT1_SPEC>;
        ///Register `TCNT1` writer
        pub type W = crate::W<TCNT1_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**Timer/Counter Register

You can [`read`](crate::Reg::read) this register and get [`tcnt1::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tcnt1::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TCNT1_SPEC;
        impl crate::RegisterSpec for TCNT1_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tcnt1::R`](R) reader structure
        impl crate::Readable for TCNT1_SPEC {}
        ///`write(|w| ..)` method takes [`tcnt1::W`](W) writer structure
        impl crate::Writable for TCNT1_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets TCNT1 to value 0
        impl crate::Resettable for TCNT1_SPEC {}
    }
    /**TIFR (rw) register accessor: Timer/Counter Interrupt Flag Register

You can [`read`](crate::Reg::read) this register and get [`tifr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tifr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@tifr`] module*/
    pub type TIFR = crate::Reg<tifr::TIFR_SPEC>;
    ///Timer/Counter Interrupt Flag Register
    pub mod tifr {
        ///Register `TIFR` reader
        pub type R = crate::R<TIFR_SPEC>;
        ///Register `TIFR` writer
        pub type W = crate::W<TIFR_SPEC>;
        ///Field `TOV1` reader - Timer/Counter1 Overflow Flag
        pub type TOV1_R = crate::BitReader;
        ///Field `TOV1` writer - Timer/Counter1 Overflow Flag
        pub type TOV1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCF1B` reader - Timer/Counter1 Output Compare Flag 1B
        pub type OCF1B_R = crate::BitReader;
        ///Field `OCF1B` writer - Timer/Counter1 Output Compare Flag 1B
        pub type OCF1B_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCF1A` reader - Timer/Counter1 Output Compare Flag 1A
        pub type OCF1A_R = crate::BitReader;
        ///Field `OCF1A` writer - Timer/Counter1 Output Compare Flag 1A
        pub type OCF1A_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCF1D` reader - Timer/Counter1 Output Compare Flag 1D
        pub type OCF1D_R = crate::BitReader;
        ///Field `OCF1D` writer - Timer/Counter1 Output Compare Flag 1D
        pub type OCF1D_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 2 - Timer/Counter1 Overflow Flag
            #[inline(always)]
            pub fn tov1(&self) -> TOV1_R {
                TOV1_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 5 - Timer/Counter1 Output Compare Flag 1B
            #[inline(always)]
            pub fn ocf1b(&self) -> OCF1B_R {
                OCF1B_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Timer/Counter1 Output Compare Flag 1A
            #[inline(always)]
            pub fn ocf1a(&self) -> OCF1A_R {
                OCF1A_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Timer/Counter1 Output Compare Flag 1D
            #[inline(always)]
            pub fn ocf1d(&self) -> OCF1D_R {
                OCF1D_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 2 - Timer/Counter1 Overflow Flag
            #[inline(always)]
            pub fn tov1(&mut self) -> TOV1_W<'_, TIFR_SPEC> {
                TOV1_W::new(self, 2)
            }
            ///Bit 5 - Timer/Counter1 Output Compare Flag 1B
            #[inline(always)]
            pub fn ocf1b(&mut self) -> OCF1B_W<'_, TIFR_SPEC> {
                OCF1B_W::new(self, 5)
            }
            ///Bit 6 - Timer/Counter1 Output Compare Flag 1A
            #[inline(always)]
            pub fn ocf1a(&mut self) -> OCF1A_W<'_, TIFR_SPEC> {
                OCF1A_W::new(self, 6)
            }
            ///Bit 7 - Timer/Counter1 Output Compare Flag 1D
            #[inline(always)]
            pub fn ocf1d(&mut self) -> OCF1D_W<'_, TIFR_SPEC> {
                OCF1D_W::new(self, 7)
            }
        }
        /**Timer/Counter Interrupt Flag Register

You can [`read`](crate::Reg::read) this register and get [`tifr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`tifr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TIFR_SPEC;
        impl crate::RegisterSpec for TIFR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`tifr::R`](R) reader structure
        impl crate::Readable for TIFR_SPEC {}
        ///`write(|w| ..)` method takes [`tifr::W`](W) writer structure
        impl crate::Writable for TIFR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TIFR to value 0
        impl crate::Resettable for TIFR_SPEC {}
    }
    /**TIMSK (rw) register accessor: Timer/Counter Interrupt Mask Register

You can [`read`](crate::Reg::read) this register and get [`timsk::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`timsk::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@timsk`] module*/
    pub type TIMSK = crate::Reg<timsk::TIMSK_SPEC>;
    ///Timer/Counter Interrupt Mask Register
    pub mod timsk {
        ///Register `TIMSK` reader
        pub type R = crate::R<TIMSK_SPEC>;
        ///Register `TIMSK` writer
        pub type W = crate::W<TIMSK_SPEC>;
        ///Field `TOIE1` reader - Timer/Counter1 Overflow Interrupt Enable
        pub type TOIE1_R = crate::BitReader;
        ///Field `TOIE1` writer - Timer/Counter1 Overflow Interrupt Enable
        pub type TOIE1_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCIE1B` reader - OCIE1A: Timer/Counter1 Output Compare B Interrupt Enable
        pub type OCIE1B_R = crate::BitReader;
        ///Field `OCIE1B` writer - OCIE1A: Timer/Counter1 Output Compare B Interrupt Enable
        pub type OCIE1B_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCIE1A` reader - OCIE1A: Timer/Counter1 Output Compare Interrupt Enable
        pub type OCIE1A_R = crate::BitReader;
        ///Field `OCIE1A` writer - OCIE1A: Timer/Counter1 Output Compare Interrupt Enable
        pub type OCIE1A_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `OCIE1D` reader - OCIE1D: Timer/Counter1 Output Compare Interrupt Enable
        pub type OCIE1D_R = crate::BitReader;
        ///Field `OCIE1D` writer - OCIE1D: Timer/Counter1 Output Compare Interrupt Enable
        pub type OCIE1D_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bit 2 - Timer/Counter1 Overflow Interrupt Enable
            #[inline(always)]
            pub fn toie1(&self) -> TOIE1_R {
                TOIE1_R::new(((self.bits >> 2) & 1) != 0)
            }
            ///Bit 5 - OCIE1A: Timer/Counter1 Output Compare B Interrupt Enable
            #[inline(always)]
            pub fn ocie1b(&self) -> OCIE1B_R {
                OCIE1B_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - OCIE1A: Timer/Counter1 Output Compare Interrupt Enable
            #[inline(always)]
            pub fn ocie1a(&self) -> OCIE1A_R {
                OCIE1A_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - OCIE1D: Timer/Counter1 Output Compare Interrupt Enable
            #[inline(always)]
            pub fn ocie1d(&self) -> OCIE1D_R {
                OCIE1D_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 2 - Timer/Counter1 Overflow Interrupt Enable
            #[inline(always)]
            pub fn toie1(&mut self) -> TOIE1_W<'_, TIMSK_SPEC> {
                TOIE1_W::new(self, 2)
            }
            ///Bit 5 - OCIE1A: Timer/Counter1 Output Compare B Interrupt Enable
            #[inline(always)]
            pub fn ocie1b(&mut self) -> OCIE1B_W<'_, TIMSK_SPEC> {
                OCIE1B_W::new(self, 5)
            }
            ///Bit 6 - OCIE1A: Timer/Counter1 Output Compare Interrupt Enable
            #[inline(always)]
            pub fn ocie1a(&mut self) -> OCIE1A_W<'_, TIMSK_SPEC> {
                OCIE1A_W::new(self, 6)
            }
            ///Bit 7 - OCIE1D: Timer/Counter1 Output Compare Interrupt Enable
            #[inline(always)]
            pub fn ocie1d(&mut self) -> OCIE1D_W<'_, TIMSK_SPEC> {
                OCIE1D_W::new(self, 7)
            }
        }
        /**Timer/Counter Interrupt Mask Register

You can [`read`](crate::Reg::read) this register and get [`timsk::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`timsk::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct TIMSK_SPEC;
        impl crate::RegisterSpec for TIMSK_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`timsk::R`](R) reader structure
        impl crate::Readable for TIMSK_SPEC {}
        ///`write(|w| ..)` method takes [`timsk::W`](W) writer structure
        impl crate::Writable for TIMSK_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets TIMSK to value 0
        impl crate::Resettable for TIMSK_SPEC {}
    }
}
///Universal Serial Interface
pub type USI = crate::Periph<usi::RegisterBlock, 0x2d>;
impl core::fmt::Debug for USI {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("USI").finish()
    }
}
///Universal Serial Interface
pub mod usi {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        usicr: USICR,
        usisr: USISR,
        usidr: USIDR,
        usibr: USIBR,
        usipp: USIPP,
    }
    impl RegisterBlock {
        ///0x00 - USI Control Register
        #[inline(always)]
        pub const fn usicr(&self) -> &USICR {
            &self.usicr
        }
        ///0x01 - USI Status Register
        #[inline(always)]
        pub const fn usisr(&self) -> &USISR {
            &self.usisr
        }
        ///0x02 - USI Data Register
        #[inline(always)]
        pub const fn usidr(&self) -> &USIDR {
            &self.usidr
        }
        ///0x03 - USI Buffer Register
        #[inline(always)]
        pub const fn usibr(&self) -> &USIBR {
            &self.usibr
        }
        ///0x04 - USI Pin Position
        #[inline(always)]
        pub const fn usipp(&self) -> &USIPP {
            &self.usipp
        }
    }
    /**USIBR (rw) register accessor: USI Buffer Register

You can [`read`](crate::Reg::read) this register and get [`usibr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usibr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@usibr`] module*/
    pub type USIBR = crate::Reg<usibr::USIBR_SPEC>;
    ///USI Buffer Register
    pub mod usibr {
        ///Register `USIBR` reader
        pub type R = crate::R<USIBR_SPEC>;
        ///Register `USIBR` writer
        pub type W = crate::W<USIBR_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**USI Buffer Register

You can [`read`](crate::Reg::read) this register and get [`usibr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usibr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct USIBR_SPEC;
        impl crate::RegisterSpec for USIBR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`usibr::R`](R) reader structure
        impl crate::Readable for USIBR_SPEC {}
        ///`write(|w| ..)` method takes [`usibr::W`](W) writer structure
        impl crate::Writable for USIBR_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets USIBR to value 0
        impl crate::Resettable for USIBR_SPEC {}
    }
    /**USICR (rw) register accessor: USI Control Register

You can [`read`](crate::Reg::read) this register and get [`usicr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usicr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@usicr`] module*/
    pub type USICR = crate::Reg<usicr::USICR_SPEC>;
    ///USI Control Register
    pub mod usicr {
        ///Register `USICR` reader
        pub type R = crate::R<USICR_SPEC>;
        ///Register `USICR` writer
        pub type W = crate::W<USICR_SPEC>;
        ///Field `USITC` writer - Toggle Clock Port Pin
        pub type USITC_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `USICLK` writer - Clock Strobe
        pub type USICLK_W<'a, REG> = crate::BitWriter<'a, REG>;
        /**USI Clock Source Select Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum USICS_A {
            ///0: No Clock/Software clock strobe
            NO_CLOCK = 0,
            ///1: Timer/Counter0 Compare Match
            TC0 = 1,
            ///2: External, positive edge
            EXT_POS = 2,
            ///3: External, negative edge
            EXT_NEG = 3,
        }
        impl From<USICS_A> for u8 {
            #[inline(always)]
            fn from(variant: USICS_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for USICS_A {
            type Ux = u8;
        }
        impl crate::IsEnum for USICS_A {}
        ///Field `USICS` reader - USI Clock Source Select Bits
        pub type USICS_R = crate::FieldReader<USICS_A>;
        impl USICS_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> USICS_A {
                match self.bits {
                    0 => USICS_A::NO_CLOCK,
                    1 => USICS_A::TC0,
                    2 => USICS_A::EXT_POS,
                    3 => USICS_A::EXT_NEG,
                    _ => unreachable!(),
                }
            }
            ///No Clock/Software clock strobe
            #[inline(always)]
            pub fn is_no_clock(&self) -> bool {
                *self == USICS_A::NO_CLOCK
            }
            ///Timer/Counter0 Compare Match
            #[inline(always)]
            pub fn is_tc0(&self) -> bool {
                *self == USICS_A::TC0
            }
            ///External, positive edge
            #[inline(always)]
            pub fn is_ext_pos(&self) -> bool {
                *self == USICS_A::EXT_POS
            }
            ///External, negative edge
            #[inline(always)]
            pub fn is_ext_neg(&self) -> bool {
                *self == USICS_A::EXT_NEG
            }
        }
        ///Field `USICS` writer - USI Clock Source Select Bits
        pub type USICS_W<'a, REG> = crate::FieldWriter<'a, REG, 2, USICS_A, crate::Safe>;
        impl<'a, REG> USICS_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///No Clock/Software clock strobe
            #[inline(always)]
            pub fn no_clock(self) -> &'a mut crate::W<REG> {
                self.variant(USICS_A::NO_CLOCK)
            }
            ///Timer/Counter0 Compare Match
            #[inline(always)]
            pub fn tc0(self) -> &'a mut crate::W<REG> {
                self.variant(USICS_A::TC0)
            }
            ///External, positive edge
            #[inline(always)]
            pub fn ext_pos(self) -> &'a mut crate::W<REG> {
                self.variant(USICS_A::EXT_POS)
            }
            ///External, negative edge
            #[inline(always)]
            pub fn ext_neg(self) -> &'a mut crate::W<REG> {
                self.variant(USICS_A::EXT_NEG)
            }
        }
        /**USI Wire Mode Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum USIWM_A {
            ///0: All detectors disabled. Port pins operates as normal.
            DISABLED = 0,
            ///1: Three-wire mode. Uses DO, DI, and USCK pins.
            THREE_WIRE = 1,
            ///2: Two-wire mode (Slave). Uses SDA (DI) and SCL (USCK) pins.
            TWO_WIRE_SLAVE = 2,
            ///3: Two-wire mode (Master). Uses SDA and SCL pins.
            TWO_WIRE_MASTER = 3,
        }
        impl From<USIWM_A> for u8 {
            #[inline(always)]
            fn from(variant: USIWM_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for USIWM_A {
            type Ux = u8;
        }
        impl crate::IsEnum for USIWM_A {}
        ///Field `USIWM` reader - USI Wire Mode Bits
        pub type USIWM_R = crate::FieldReader<USIWM_A>;
        impl USIWM_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> USIWM_A {
                match self.bits {
                    0 => USIWM_A::DISABLED,
                    1 => USIWM_A::THREE_WIRE,
                    2 => USIWM_A::TWO_WIRE_SLAVE,
                    3 => USIWM_A::TWO_WIRE_MASTER,
                    _ => unreachable!(),
                }
            }
            ///All detectors disabled. Port pins operates as normal.
            #[inline(always)]
            pub fn is_disabled(&self) -> bool {
                *self == USIWM_A::DISABLED
            }
            ///Three-wire mode. Uses DO, DI, and USCK pins.
            #[inline(always)]
            pub fn is_three_wire(&self) -> bool {
                *self == USIWM_A::THREE_WIRE
            }
            ///Two-wire mode (Slave). Uses SDA (DI) and SCL (USCK) pins.
            #[inline(always)]
            pub fn is_two_wire_slave(&self) -> bool {
                *self == USIWM_A::TWO_WIRE_SLAVE
            }
            ///Two-wire mode (Master). Uses SDA and SCL pins.
            #[inline(always)]
            pub fn is_two_wire_master(&self) -> bool {
                *self == USIWM_A::TWO_WIRE_MASTER
            }
        }
        ///Field `USIWM` writer - USI Wire Mode Bits
        pub type USIWM_W<'a, REG> = crate::FieldWriter<'a, REG, 2, USIWM_A, crate::Safe>;
        impl<'a, REG> USIWM_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///All detectors disabled. Port pins operates as normal.
            #[inline(always)]
            pub fn disabled(self) -> &'a mut crate::W<REG> {
                self.variant(USIWM_A::DISABLED)
            }
            ///Three-wire mode. Uses DO, DI, and USCK pins.
            #[inline(always)]
            pub fn three_wire(self) -> &'a mut crate::W<REG> {
                self.variant(USIWM_A::THREE_WIRE)
            }
            ///Two-wire mode (Slave). Uses SDA (DI) and SCL (USCK) pins.
            #[inline(always)]
            pub fn two_wire_slave(self) -> &'a mut crate::W<REG> {
                self.variant(USIWM_A::TWO_WIRE_SLAVE)
            }
            ///Two-wire mode (Master). Uses SDA and SCL pins.
            #[inline(always)]
            pub fn two_wire_master(self) -> &'a mut crate::W<REG> {
                self.variant(USIWM_A::TWO_WIRE_MASTER)
            }
        }
        ///Field `USIOIE` reader - Counter Overflow Interrupt Enable
        pub type USIOIE_R = crate::BitReader;
        ///Field `USIOIE` writer - Counter Overflow Interrupt Enable
        pub type USIOIE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `USISIE` reader - Start Condition Interrupt Enable
        pub type USISIE_R = crate::BitReader;
        ///Field `USISIE` writer - Start Condition Interrupt Enable
        pub type USISIE_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 2:3 - USI Clock Source Select Bits
            #[inline(always)]
            pub fn usics(&self) -> USICS_R {
                USICS_R::new((self.bits >> 2) & 3)
            }
            ///Bits 4:5 - USI Wire Mode Bits
            #[inline(always)]
            pub fn usiwm(&self) -> USIWM_R {
                USIWM_R::new((self.bits >> 4) & 3)
            }
            ///Bit 6 - Counter Overflow Interrupt Enable
            #[inline(always)]
            pub fn usioie(&self) -> USIOIE_R {
                USIOIE_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Start Condition Interrupt Enable
            #[inline(always)]
            pub fn usisie(&self) -> USISIE_R {
                USISIE_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bit 0 - Toggle Clock Port Pin
            #[inline(always)]
            pub fn usitc(&mut self) -> USITC_W<'_, USICR_SPEC> {
                USITC_W::new(self, 0)
            }
            ///Bit 1 - Clock Strobe
            #[inline(always)]
            pub fn usiclk(&mut self) -> USICLK_W<'_, USICR_SPEC> {
                USICLK_W::new(self, 1)
            }
            ///Bits 2:3 - USI Clock Source Select Bits
            #[inline(always)]
            pub fn usics(&mut self) -> USICS_W<'_, USICR_SPEC> {
                USICS_W::new(self, 2)
            }
            ///Bits 4:5 - USI Wire Mode Bits
            #[inline(always)]
            pub fn usiwm(&mut self) -> USIWM_W<'_, USICR_SPEC> {
                USIWM_W::new(self, 4)
            }
            ///Bit 6 - Counter Overflow Interrupt Enable
            #[inline(always)]
            pub fn usioie(&mut self) -> USIOIE_W<'_, USICR_SPEC> {
                USIOIE_W::new(self, 6)
            }
            ///Bit 7 - Start Condition Interrupt Enable
            #[inline(always)]
            pub fn usisie(&mut self) -> USISIE_W<'_, USICR_SPEC> {
                USISIE_W::new(self, 7)
            }
        }
        /**USI Control Register

You can [`read`](crate::Reg::read) this register and get [`usicr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usicr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct USICR_SPEC;
        impl crate::RegisterSpec for USICR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`usicr::R`](R) reader structure
        impl crate::Readable for USICR_SPEC {}
        ///`write(|w| ..)` method takes [`usicr::W`](W) writer structure
        impl crate::Writable for USICR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets USICR to value 0
        impl crate::Resettable for USICR_SPEC {}
    }
    /**USIDR (rw) register accessor: USI Data Register

You can [`read`](crate::Reg::read) this register and get [`usidr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usidr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@usidr`] module*/
    pub type USIDR = crate::Reg<usidr::USIDR_SPEC>;
    ///USI Data Register
    pub mod usidr {
        ///Register `USIDR` reader
        pub type R = crate::R<USIDR_SPEC>;
        ///Register `USIDR` writer
        pub type W = crate::W<USIDR_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**USI Data Register

You can [`read`](crate::Reg::read) this register and get [`usidr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usidr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct USIDR_SPEC;
        impl crate::RegisterSpec for USIDR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`usidr::R`](R) reader structure
        impl crate::Readable for USIDR_SPEC {}
        ///`write(|w| ..)` method takes [`usidr::W`](W) writer structure
        impl crate::Writable for USIDR_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets USIDR to value 0
        impl crate::Resettable for USIDR_SPEC {}
    }
    /**USIPP (rw) register accessor: USI Pin Position

You can [`read`](crate::Reg::read) this register and get [`usipp::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usipp::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@usipp`] module*/
    pub type USIPP = crate::Reg<usipp::USIPP_SPEC>;
    ///USI Pin Position
    pub mod usipp {
        ///Register `USIPP` reader
        pub type R = crate::R<USIPP_SPEC>;
        ///Register `USIPP` writer
        pub type W = crate::W<USIPP_SPEC>;
        impl core::fmt::Debug for R {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "{}", self.bits())
            }
        }
        impl W {}
        /**USI Pin Position

You can [`read`](crate::Reg::read) this register and get [`usipp::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usipp::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct USIPP_SPEC;
        impl crate::RegisterSpec for USIPP_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`usipp::R`](R) reader structure
        impl crate::Readable for USIPP_SPEC {}
        ///`write(|w| ..)` method takes [`usipp::W`](W) writer structure
        impl crate::Writable for USIPP_SPEC {
            type Safety = crate::Safe;
        }
        ///`reset()` method sets USIPP to value 0
        impl crate::Resettable for USIPP_SPEC {}
    }
    /**USISR (rw) register accessor: USI Status Register

You can [`read`](crate::Reg::read) this register and get [`usisr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usisr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@usisr`] module*/
    pub type USISR = crate::Reg<usisr::USISR_SPEC>;
    ///USI Status Register
    pub mod usisr {
        ///Register `USISR` reader
        pub type R = crate::R<USISR_SPEC>;
        ///Register `USISR` writer
        pub type W = crate::W<USISR_SPEC>;
        ///Field `USICNT` reader - USI Counter Value Bits
        pub type USICNT_R = crate::FieldReader;
        ///Field `USICNT` writer - USI Counter Value Bits
        pub type USICNT_W<'a, REG> = crate::FieldWriter<'a, REG, 4, u8, crate::Safe>;
        ///Field `USIDC` reader - Data Output Collision
        pub type USIDC_R = crate::BitReader;
        ///Field `USIPF` reader - Stop Condition Flag
        pub type USIPF_R = crate::BitReader;
        ///Field `USIPF` writer - Stop Condition Flag
        pub type USIPF_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `USIOIF` reader - Counter Overflow Interrupt Flag
        pub type USIOIF_R = crate::BitReader;
        ///Field `USIOIF` writer - Counter Overflow Interrupt Flag
        pub type USIOIF_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `USISIF` reader - Start Condition Interrupt Flag
        pub type USISIF_R = crate::BitReader;
        ///Field `USISIF` writer - Start Condition Interrupt Flag
        pub type USISIF_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:3 - USI Counter Value Bits
            #[inline(always)]
            pub fn usicnt(&self) -> USICNT_R {
                USICNT_R::new(self.bits & 0x0f)
            }
            ///Bit 4 - Data Output Collision
            #[inline(always)]
            pub fn usidc(&self) -> USIDC_R {
                USIDC_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Stop Condition Flag
            #[inline(always)]
            pub fn usipf(&self) -> USIPF_R {
                USIPF_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Counter Overflow Interrupt Flag
            #[inline(always)]
            pub fn usioif(&self) -> USIOIF_R {
                USIOIF_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Start Condition Interrupt Flag
            #[inline(always)]
            pub fn usisif(&self) -> USISIF_R {
                USISIF_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:3 - USI Counter Value Bits
            #[inline(always)]
            pub fn usicnt(&mut self) -> USICNT_W<'_, USISR_SPEC> {
                USICNT_W::new(self, 0)
            }
            ///Bit 5 - Stop Condition Flag
            #[inline(always)]
            pub fn usipf(&mut self) -> USIPF_W<'_, USISR_SPEC> {
                USIPF_W::new(self, 5)
            }
            ///Bit 6 - Counter Overflow Interrupt Flag
            #[inline(always)]
            pub fn usioif(&mut self) -> USIOIF_W<'_, USISR_SPEC> {
                USIOIF_W::new(self, 6)
            }
            ///Bit 7 - Start Condition Interrupt Flag
            #[inline(always)]
            pub fn usisif(&mut self) -> USISIF_W<'_, USISR_SPEC> {
                USISIF_W::new(self, 7)
            }
        }
        /**USI Status Register

You can [`read`](crate::Reg::read) this register and get [`usisr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`usisr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct USISR_SPEC;
        impl crate::RegisterSpec for USISR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`usisr::R`](R) reader structure
        impl crate::Readable for USISR_SPEC {}
        ///`write(|w| ..)` method takes [`usisr::W`](W) writer structure
        impl crate::Writable for USISR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets USISR to value 0
        impl crate::Resettable for USISR_SPEC {}
    }
}
///Watchdog Timer
pub type WDT = crate::Periph<wdt::RegisterBlock, 0x41>;
impl core::fmt::Debug for WDT {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("WDT").finish()
    }
}
///Watchdog Timer
pub mod wdt {
    #[repr(C)]
    ///Register block
    pub struct RegisterBlock {
        wdtcr: WDTCR,
    }
    impl RegisterBlock {
        ///0x00 - Watchdog Timer Control Register
        #[inline(always)]
        pub const fn wdtcr(&self) -> &WDTCR {
            &self.wdtcr
        }
    }
    /**WDTCR (rw) register accessor: Watchdog Timer Control Register

You can [`read`](crate::Reg::read) this register and get [`wdtcr::R`]. You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`wdtcr::W`]. You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).

For information about available fields see [`mod@wdtcr`] module*/
    pub type WDTCR = crate::Reg<wdtcr::WDTCR_SPEC>;
    ///Watchdog Timer Control Register
    pub mod wdtcr {
        ///Register `WDTCR` reader
        pub type R = crate::R<WDTCR_SPEC>;
        ///Register `WDTCR` writer
        pub type W = crate::W<WDTCR_SPEC>;
        /**Watchdog Timer Prescaler - Low Bits

Value on reset: 0*/
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum WDPL_A {
            ///0: - 2048 cycles, ~16ms/512K (524288) cycles, ~4s if WDPH is set
            CYCLES_2K_512K = 0,
            ///1: - 4096 cycles, ~32ms/1024K (1048576) cycles, ~8s if WDPH is set
            CYCLES_4K_1024K = 1,
            ///2: - 8192 cycles, ~64ms
            CYCLES_8K = 2,
            ///3: - 16K (16384) cycles, ~0.125s
            CYCLES_16K = 3,
            ///4: - 32K (32768) cycles, ~0.25s
            CYCLES_32K = 4,
            ///5: - 64K (65536) cycles, ~0.5s
            CYCLES_64K = 5,
            ///6: - 128K (131072) cycles, ~1s
            CYCLES_128K = 6,
            ///7: - 256K (262144) cycles, ~2s
            CYCLES_256K = 7,
        }
        impl From<WDPL_A> for u8 {
            #[inline(always)]
            fn from(variant: WDPL_A) -> Self {
                variant as _
            }
        }
        impl crate::FieldSpec for WDPL_A {
            type Ux = u8;
        }
        impl crate::IsEnum for WDPL_A {}
        ///Field `WDPL` reader - Watchdog Timer Prescaler - Low Bits
        pub type WDPL_R = crate::FieldReader<WDPL_A>;
        impl WDPL_R {
            ///Get enumerated values variant
            #[inline(always)]
            pub const fn variant(&self) -> WDPL_A {
                match self.bits {
                    0 => WDPL_A::CYCLES_2K_512K,
                    1 => WDPL_A::CYCLES_4K_1024K,
                    2 => WDPL_A::CYCLES_8K,
                    3 => WDPL_A::CYCLES_16K,
                    4 => WDPL_A::CYCLES_32K,
                    5 => WDPL_A::CYCLES_64K,
                    6 => WDPL_A::CYCLES_128K,
                    7 => WDPL_A::CYCLES_256K,
                    _ => unreachable!(),
                }
            }
            ///- 2048 cycles, ~16ms/512K (524288) cycles, ~4s if WDPH is set
            #[inline(always)]
            pub fn is_cycles_2k_512k(&self) -> bool {
                *self == WDPL_A::CYCLES_2K_512K
            }
            ///- 4096 cycles, ~32ms/1024K (1048576) cycles, ~8s if WDPH is set
            #[inline(always)]
            pub fn is_cycles_4k_1024k(&self) -> bool {
                *self == WDPL_A::CYCLES_4K_1024K
            }
            ///- 8192 cycles, ~64ms
            #[inline(always)]
            pub fn is_cycles_8k(&self) -> bool {
                *self == WDPL_A::CYCLES_8K
            }
            ///- 16K (16384) cycles, ~0.125s
            #[inline(always)]
            pub fn is_cycles_16k(&self) -> bool {
                *self == WDPL_A::CYCLES_16K
            }
            ///- 32K (32768) cycles, ~0.25s
            #[inline(always)]
            pub fn is_cycles_32k(&self) -> bool {
                *self == WDPL_A::CYCLES_32K
            }
            ///- 64K (65536) cycles, ~0.5s
            #[inline(always)]
            pub fn is_cycles_64k(&self) -> bool {
                *self == WDPL_A::CYCLES_64K
            }
            ///- 128K (131072) cycles, ~1s
            #[inline(always)]
            pub fn is_cycles_128k(&self) -> bool {
                *self == WDPL_A::CYCLES_128K
            }
            ///- 256K (262144) cycles, ~2s
            #[inline(always)]
            pub fn is_cycles_256k(&self) -> bool {
                *self == WDPL_A::CYCLES_256K
            }
        }
        ///Field `WDPL` writer - Watchdog Timer Prescaler - Low Bits
        pub type WDPL_W<'a, REG> = crate::FieldWriter<'a, REG, 3, WDPL_A, crate::Safe>;
        impl<'a, REG> WDPL_W<'a, REG>
        where
            REG: crate::Writable + crate::RegisterSpec,
            REG::Ux: From<u8>,
        {
            ///- 2048 cycles, ~16ms/512K (524288) cycles, ~4s if WDPH is set
            #[inline(always)]
            pub fn cycles_2k_512k(self) -> &'a mut crate::W<REG> {
                self.variant(WDPL_A::CYCLES_2K_512K)
            }
            ///- 4096 cycles, ~32ms/1024K (1048576) cycles, ~8s if WDPH is set
            #[inline(always)]
            pub fn cycles_4k_1024k(self) -> &'a mut crate::W<REG> {
                self.variant(WDPL_A::CYCLES_4K_1024K)
            }
            ///- 8192 cycles, ~64ms
            #[inline(always)]
            pub fn cycles_8k(self) -> &'a mut crate::W<REG> {
                self.variant(WDPL_A::CYCLES_8K)
            }
            ///- 16K (16384) cycles, ~0.125s
            #[inline(always)]
            pub fn cycles_16k(self) -> &'a mut crate::W<REG> {
                self.variant(WDPL_A::CYCLES_16K)
            }
            ///- 32K (32768) cycles, ~0.25s
            #[inline(always)]
            pub fn cycles_32k(self) -> &'a mut crate::W<REG> {
                self.variant(WDPL_A::CYCLES_32K)
            }
            ///- 64K (65536) cycles, ~0.5s
            #[inline(always)]
            pub fn cycles_64k(self) -> &'a mut crate::W<REG> {
                self.variant(WDPL_A::CYCLES_64K)
            }
            ///- 128K (131072) cycles, ~1s
            #[inline(always)]
            pub fn cycles_128k(self) -> &'a mut crate::W<REG> {
                self.variant(WDPL_A::CYCLES_128K)
            }
            ///- 256K (262144) cycles, ~2s
            #[inline(always)]
            pub fn cycles_256k(self) -> &'a mut crate::W<REG> {
                self.variant(WDPL_A::CYCLES_256K)
            }
        }
        ///Field `WDE` reader - Watch Dog Enable
        pub type WDE_R = crate::BitReader;
        ///Field `WDE` writer - Watch Dog Enable
        pub type WDE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `WDCE` reader - Watchdog Change Enable
        pub type WDCE_R = crate::BitReader;
        ///Field `WDCE` writer - Watchdog Change Enable
        pub type WDCE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `WDPH` reader - Watchdog Timer Prescaler - High Bit
        pub type WDPH_R = crate::BitReader;
        ///Field `WDPH` writer - Watchdog Timer Prescaler - High Bit
        pub type WDPH_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `WDIE` reader - Watchdog Timeout Interrupt Enable
        pub type WDIE_R = crate::BitReader;
        ///Field `WDIE` writer - Watchdog Timeout Interrupt Enable
        pub type WDIE_W<'a, REG> = crate::BitWriter<'a, REG>;
        ///Field `WDIF` reader - Watchdog Timeout Interrupt Flag
        pub type WDIF_R = crate::BitReader;
        ///Field `WDIF` writer - Watchdog Timeout Interrupt Flag
        pub type WDIF_W<'a, REG> = crate::BitWriter<'a, REG>;
        impl R {
            ///Bits 0:2 - Watchdog Timer Prescaler - Low Bits
            #[inline(always)]
            pub fn wdpl(&self) -> WDPL_R {
                WDPL_R::new(self.bits & 7)
            }
            ///Bit 3 - Watch Dog Enable
            #[inline(always)]
            pub fn wde(&self) -> WDE_R {
                WDE_R::new(((self.bits >> 3) & 1) != 0)
            }
            ///Bit 4 - Watchdog Change Enable
            #[inline(always)]
            pub fn wdce(&self) -> WDCE_R {
                WDCE_R::new(((self.bits >> 4) & 1) != 0)
            }
            ///Bit 5 - Watchdog Timer Prescaler - High Bit
            #[inline(always)]
            pub fn wdph(&self) -> WDPH_R {
                WDPH_R::new(((self.bits >> 5) & 1) != 0)
            }
            ///Bit 6 - Watchdog Timeout Interrupt Enable
            #[inline(always)]
            pub fn wdie(&self) -> WDIE_R {
                WDIE_R::new(((self.bits >> 6) & 1) != 0)
            }
            ///Bit 7 - Watchdog Timeout Interrupt Flag
            #[inline(always)]
            pub fn wdif(&self) -> WDIF_R {
                WDIF_R::new(((self.bits >> 7) & 1) != 0)
            }
        }
        impl W {
            ///Bits 0:2 - Watchdog Timer Prescaler - Low Bits
            #[inline(always)]
            pub fn wdpl(&mut self) -> WDPL_W<'_, WDTCR_SPEC> {
                WDPL_W::new(self, 0)
            }
            ///Bit 3 - Watch Dog Enable
            #[inline(always)]
            pub fn wde(&mut self) -> WDE_W<'_, WDTCR_SPEC> {
                WDE_W::new(self, 3)
            }
            ///Bit 4 - Watchdog Change Enable
            #[inline(always)]
            pub fn wdce(&mut self) -> WDCE_W<'_, WDTCR_SPEC> {
                WDCE_W::new(self, 4)
            }
            ///Bit 5 - Watchdog Timer Prescaler - High Bit
            #[inline(always)]
            pub fn wdph(&mut self) -> WDPH_W<'_, WDTCR_SPEC> {
                WDPH_W::new(self, 5)
            }
            ///Bit 6 - Watchdog Timeout Interrupt Enable
            #[inline(always)]
            pub fn wdie(&mut self) -> WDIE_W<'_, WDTCR_SPEC> {
                WDIE_W::new(self, 6)
            }
            ///Bit 7 - Watchdog Timeout Interrupt Flag
            #[inline(always)]
            pub fn wdif(&mut self) -> WDIF_W<'_, WDTCR_SPEC> {
                WDIF_W::new(self, 7)
            }
        }
        /**Watchdog Timer Control Register

You can [`read`](crate::Reg::read) this register and get [`wdtcr::R`](R). You can [`reset`](crate::Reg::reset), [`write`](crate::Reg::write), [`write_with_zero`](crate::Reg::write_with_zero) this register using [`wdtcr::W`](W). You can also [`modify`](crate::Reg::modify) this register. See [API](https://docs.rs/svd2rust/#read--modify--write-api).*/
        pub struct WDTCR_SPEC;
        impl crate::RegisterSpec for WDTCR_SPEC {
            type Ux = u8;
        }
        ///`read()` method returns [`wdtcr::R`](R) reader structure
        impl crate::Readable for WDTCR_SPEC {}
        ///`write(|w| ..)` method takes [`wdtcr::W`](W) writer structure
        impl crate::Writable for WDTCR_SPEC {
            type Safety = crate::Unsafe;
        }
        ///`reset()` method sets WDTCR to value 0
        impl crate::Resettable for WDTCR_SPEC {}
    }
}
use super::DEVICE_PERIPHERALS;
/// All the peripherals.
#[allow(non_snake_case)]
pub struct Peripherals {
    ///AC
    pub AC: AC,
    ///ADC
    pub ADC: ADC,
    ///BOOT_LOAD
    pub BOOT_LOAD: BOOT_LOAD,
    ///CPU
    pub CPU: CPU,
    ///EEPROM
    pub EEPROM: EEPROM,
    ///EXINT
    pub EXINT: EXINT,
    ///FUSE
    pub FUSE: FUSE,
    ///LOCKBIT
    pub LOCKBIT: LOCKBIT,
    ///PORTA
    pub PORTA: PORTA,
    ///PORTB
    pub PORTB: PORTB,
    ///TC0
    pub TC0: TC0,
    ///TC1
    pub TC1: TC1,
    ///USI
    pub USI: USI,
    ///WDT
    pub WDT: WDT,
}
impl Peripherals {
    /// Returns all the peripherals *once*.
    #[cfg(feature = "critical-section")]
    #[inline]
    pub fn take() -> Option<Self> {
        critical_section::with(|_| {
            if unsafe { DEVICE_PERIPHERALS } {
                return None;
            }
            Some(unsafe { Peripherals::steal() })
        })
    }
    /// Unchecked version of `Peripherals::take`.
    ///
    /// # Safety
    ///
    /// Each of the returned peripherals must be used at most once.
    #[inline]
    pub unsafe fn steal() -> Self {
        DEVICE_PERIPHERALS = true;
        Peripherals {
            AC: AC::steal(),
            ADC: ADC::steal(),
            BOOT_LOAD: BOOT_LOAD::steal(),
            CPU: CPU::steal(),
            EEPROM: EEPROM::steal(),
            EXINT: EXINT::steal(),
            FUSE: FUSE::steal(),
            LOCKBIT: LOCKBIT::steal(),
            PORTA: PORTA::steal(),
            PORTB: PORTB::steal(),
            TC0: TC0::steal(),
            TC1: TC1::steal(),
            USI: USI::steal(),
            WDT: WDT::steal(),
        }
    }
}
