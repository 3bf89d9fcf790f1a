//! The LS-8 machine: fetch-decode-execute loop, interrupt controller, and
//! stack discipline.
//!
//! The machine exclusively owns registers, memory, PC, FL, and interrupt
//! state. Each cycle polls the timer, services at most one pending
//! interrupt, then fetches and executes one instruction. `HLT` terminates
//! the loop with a success result; faults propagate as typed errors.

use std::time::Duration;

use crate::alu;
use crate::clock::TimeSource;
use crate::console::{char_for_word, Console};
use crate::decoder::{DecodedInstruction, Decoder, Opcode};
use crate::fault::Fault;
use crate::loader::LoadError;
use crate::memory::{Memory, MEMORY_SIZE, SP_BOOT};
use crate::state::{RegisterFile, RunState, Word, TIMER_INTERRUPT_LINE};

/// Number of memory cells as a word, for SP bound checks.
#[allow(clippy::cast_possible_wrap)]
const MEMORY_CELLS: Word = MEMORY_SIZE as Word;

/// Tunable machine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Interval between timer interrupts.
    pub timer_interval: Duration,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            timer_interval: Duration::from_secs(1),
        }
    }
}

/// Outcome of one dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// An instruction retired and the machine remains runnable.
    Executed,
    /// A pending interrupt was taken; no instruction was fetched.
    InterruptEntered {
        /// The serviced interrupt line (0-7).
        line: u8,
    },
    /// `HLT` has retired; the machine is halted.
    Halted,
}

/// A complete LS-8 machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Machine {
    regs: RegisterFile,
    memory: Memory,
    pc: u8,
    fl: Word,
    interrupts_enabled: bool,
    run_state: RunState,
    last_tick: Duration,
    config: MachineConfig,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    /// Creates a machine at boot state: zeroed registers and memory,
    /// PC = 0, SP at its boot address, interrupts enabled.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        let mut regs = RegisterFile::default();
        regs.set_sp(SP_BOOT);

        Self {
            regs,
            memory: Memory::default(),
            pc: 0,
            fl: 0,
            interrupts_enabled: true,
            run_state: RunState::Running,
            last_tick: Duration::ZERO,
            config,
        }
    }

    /// Loads a program image into memory starting at address 0.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ProgramTooLarge`] when the image does not fit.
    pub fn load(&mut self, image: &[u8]) -> Result<(), LoadError> {
        self.memory.load(image)
    }

    /// Current program counter.
    #[must_use]
    pub const fn pc(&self) -> u8 {
        self.pc
    }

    /// Repoints the program counter, for embedding hosts and tests.
    pub const fn set_pc(&mut self, addr: u8) {
        self.pc = addr;
    }

    /// Current flags word.
    #[must_use]
    pub const fn fl(&self) -> Word {
        self.fl
    }

    /// Writes the flags word.
    pub const fn set_fl(&mut self, value: Word) {
        self.fl = value;
    }

    /// Current execution state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Whether the interrupt controller will service pending lines.
    #[must_use]
    pub const fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    /// The register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Mutable register file access, for embedding hosts and tests.
    pub const fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// The memory image.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable memory access, for embedding hosts and tests.
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Executes one dispatch cycle: timer poll, interrupt scan, then one
    /// fetch-decode-execute pass. A halted machine reports
    /// [`StepOutcome::Halted`] without touching state.
    ///
    /// # Errors
    ///
    /// Propagates any [`Fault`] raised during decode or execution; machine
    /// state is left as it was at the failing operation.
    pub fn step(
        &mut self,
        clock: &mut dyn TimeSource,
        console: &mut dyn Console,
    ) -> Result<StepOutcome, Fault> {
        if self.run_state.is_halted() {
            return Ok(StepOutcome::Halted);
        }

        self.poll_timer(clock);

        if self.interrupts_enabled {
            if let Some(line) = self.enter_pending_interrupt()? {
                return Ok(StepOutcome::InterruptEntered { line });
            }
        }

        let byte = low_byte(self.memory.read(self.pc));
        let Some(instr) = Decoder::decode(byte) else {
            return Err(Fault::UnknownOpcode { pc: self.pc, byte });
        };

        // Operand bytes are read unconditionally; unused reads are harmless.
        let op1 = low_byte(self.memory.read(self.pc.wrapping_add(1)));
        let op2 = low_byte(self.memory.read(self.pc.wrapping_add(2)));

        self.execute(instr, op1, op2, console)?;

        if !instr.sets_pc {
            self.pc = self.pc.wrapping_add(instr.length());
        }

        if self.run_state.is_halted() {
            return Ok(StepOutcome::Halted);
        }
        Ok(StepOutcome::Executed)
    }

    /// Runs dispatch cycles until `HLT` retires.
    ///
    /// # Errors
    ///
    /// Propagates the first [`Fault`] raised by any cycle.
    pub fn run(
        &mut self,
        clock: &mut dyn TimeSource,
        console: &mut dyn Console,
    ) -> Result<(), Fault> {
        loop {
            match self.step(clock, console)? {
                StepOutcome::Halted => return Ok(()),
                StepOutcome::Executed | StepOutcome::InterruptEntered { .. } => {}
            }
        }
    }

    /// One-line state dump: PC, the three bytes at PC, and all registers
    /// in hex.
    #[must_use]
    pub fn trace(&self) -> String {
        use std::fmt::Write as _;

        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            low_byte(self.memory.read(self.pc)),
            low_byte(self.memory.read(self.pc.wrapping_add(1))),
            low_byte(self.memory.read(self.pc.wrapping_add(2))),
        );
        for value in self.regs.all() {
            let _ = write!(line, " {value:02X}");
        }
        line
    }

    fn poll_timer(&mut self, clock: &mut dyn TimeSource) {
        let now = clock.now();
        if now.saturating_sub(self.last_tick) >= self.config.timer_interval {
            self.regs.raise_is_bit(TIMER_INTERRUPT_LINE);
            self.last_tick = now;
        }
    }

    /// Services the lowest pending unmasked interrupt line, if any:
    /// disables interrupts, clears the line in IS, pushes PC, FL, and
    /// R6 down to R0, then vectors PC through the slot for the line.
    fn enter_pending_interrupt(&mut self) -> Result<Option<u8>, Fault> {
        let masked = self.regs.im() & self.regs.is_bits();
        if masked == 0 {
            return Ok(None);
        }

        for line in 0..8_u8 {
            if masked & (1 << line) == 0 {
                continue;
            }

            self.interrupts_enabled = false;
            self.regs.clear_is_bit(line);
            self.push(Word::from(self.pc))?;
            self.push(self.fl)?;
            for index in (0..=6_u8).rev() {
                let value = self.regs.get(index)?;
                self.push(value)?;
            }
            self.pc = low_byte(self.memory.read(Memory::vector_slot(line)));
            return Ok(Some(line));
        }
        Ok(None)
    }

    fn execute(
        &mut self,
        instr: DecodedInstruction,
        op1: u8,
        op2: u8,
        console: &mut dyn Console,
    ) -> Result<(), Fault> {
        match instr.opcode {
            Opcode::Ldi => self.regs.set(op1, Word::from(op2)),
            Opcode::Prn => {
                console.write_decimal(self.regs.get(op1)?);
                Ok(())
            }
            Opcode::Pra => {
                console.write_char(char_for_word(self.regs.get(op1)?));
                Ok(())
            }
            Opcode::Hlt => {
                self.run_state = RunState::Halted;
                Ok(())
            }
            Opcode::Add | Opcode::Mul => alu::apply(&mut self.regs, instr.opcode, op1, op2),
            Opcode::Push => {
                let value = self.regs.get(op1)?;
                self.push(value)
            }
            Opcode::Pop => {
                let value = self.pop()?;
                self.regs.set(op1, value)
            }
            Opcode::Call => {
                self.push(Word::from(self.pc.wrapping_add(2)))?;
                self.pc = low_byte(self.regs.get(op1)?);
                Ok(())
            }
            Opcode::Ret => {
                self.pc = low_byte(self.pop()?);
                Ok(())
            }
            Opcode::St => {
                let addr = low_byte(self.regs.get(op1)?);
                let value = self.regs.get(op2)?;
                self.memory.write(addr, value);
                Ok(())
            }
            Opcode::Jmp => {
                self.pc = low_byte(self.regs.get(op1)?);
                Ok(())
            }
            Opcode::Iret => {
                // Entry pushed R6 down to R0, so restoration pops R0 up to R6.
                for index in 0..=6_u8 {
                    let value = self.pop()?;
                    self.regs.set(index, value)?;
                }
                self.fl = self.pop()?;
                self.pc = low_byte(self.pop()?);
                self.interrupts_enabled = true;
                Ok(())
            }
        }
    }

    fn push(&mut self, value: Word) -> Result<(), Fault> {
        let sp = self.regs.sp();
        if sp < 1 || sp > MEMORY_CELLS {
            return Err(Fault::StackOverflow { sp });
        }
        let new_sp = sp - 1;
        self.regs.set_sp(new_sp);
        self.memory.write(low_byte(new_sp), value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Word, Fault> {
        let sp = self.regs.sp();
        if sp < 0 || sp >= MEMORY_CELLS {
            return Err(Fault::StackUnderflow { sp });
        }
        let value = self.memory.read(low_byte(sp));
        self.regs.set_sp(sp + 1);
        Ok(value)
    }
}

/// Low byte of a word, used for instruction fetch and address formation.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn low_byte(word: Word) -> u8 {
    (word & 0xFF) as u8
}

#[cfg(test)]
mod tests {
    use super::{Machine, MachineConfig, StepOutcome};
    use crate::clock::ManualClock;
    use crate::console::BufferConsole;
    use crate::fault::Fault;
    use crate::memory::SP_BOOT;
    use crate::state::{RunState, Word, IM, SP};
    use proptest::prelude::*;
    use std::time::Duration;

    const LDI: u8 = 0b1000_0010;
    const PRN: u8 = 0b0100_0111;
    const HLT: u8 = 0b0000_0001;
    const MUL: u8 = 0b1010_0010;
    const ADD: u8 = 0b1010_0000;
    const PUSH: u8 = 0b0100_0101;
    const POP: u8 = 0b0100_0110;
    const CALL: u8 = 0b0101_0000;
    const RET: u8 = 0b0001_0001;
    const ST: u8 = 0b1000_0100;
    const JMP: u8 = 0b0101_0100;

    fn run_program(image: &[u8]) -> (Machine, BufferConsole) {
        let mut machine = Machine::default();
        machine.load(image).expect("image fits in memory");
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();
        machine
            .run(&mut clock, &mut console)
            .expect("program runs to HLT");
        (machine, console)
    }

    #[test]
    fn boot_state_matches_the_architecture() {
        let machine = Machine::default();
        assert_eq!(machine.pc(), 0);
        assert_eq!(machine.fl(), 0);
        assert_eq!(machine.run_state(), RunState::Running);
        assert!(machine.interrupts_enabled());
        assert_eq!(machine.registers().sp(), SP_BOOT);
    }

    #[test]
    fn ldi_then_hlt_loads_register_and_halts() {
        let (machine, _) = run_program(&[LDI, 0, 8, HLT]);
        assert_eq!(machine.registers().get(0).expect("index in range"), 8);
        assert!(machine.run_state().is_halted());
    }

    #[test]
    fn prn_writes_decimal_value_and_newline() {
        let (machine, console) = run_program(&[LDI, 0, 8, PRN, 0, HLT]);
        assert_eq!(console.contents(), "8\n");
        assert!(machine.run_state().is_halted());
    }

    #[test]
    fn mul_program_prints_27() {
        let (_, console) = run_program(&[LDI, 0, 9, LDI, 1, 3, MUL, 0, 1, PRN, 0, HLT]);
        assert_eq!(console.contents(), "27\n");
    }

    #[test]
    fn add_program_sums_registers() {
        let (machine, _) = run_program(&[LDI, 0, 200, LDI, 1, 100, ADD, 0, 1, HLT]);
        assert_eq!(machine.registers().get(0).expect("index in range"), 300);
    }

    #[test]
    fn call_then_ret_resumes_after_the_call_site() {
        // 0: LDI R0,6 ; 3: CALL R0 ; 5: HLT ; 6: LDI R1,99 ; 9: RET
        let (machine, _) = run_program(&[LDI, 0, 6, CALL, 0, HLT, LDI, 1, 99, RET]);
        assert!(machine.run_state().is_halted());
        assert_eq!(machine.registers().get(1).expect("index in range"), 99);
        assert_eq!(machine.registers().sp(), SP_BOOT);
    }

    #[test]
    fn jmp_sets_pc_without_auto_advance() {
        let mut machine = Machine::default();
        machine.load(&[LDI, 0, 5, JMP, 0, HLT]).expect("image fits");
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        assert_eq!(
            machine.step(&mut clock, &mut console),
            Ok(StepOutcome::Executed)
        );
        assert_eq!(
            machine.step(&mut clock, &mut console),
            Ok(StepOutcome::Executed)
        );
        assert_eq!(machine.pc(), 5);
    }

    #[test]
    fn st_writes_through_register_addressing() {
        let (machine, _) = run_program(&[LDI, 0, 100, LDI, 1, 7, ST, 0, 1, HLT]);
        assert_eq!(machine.memory().read(100), 7);
    }

    #[test]
    fn halted_machine_steps_are_inert() {
        let mut machine = Machine::default();
        machine.load(&[HLT]).expect("image fits");
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        assert_eq!(
            machine.step(&mut clock, &mut console),
            Ok(StepOutcome::Halted)
        );
        let snapshot = machine.clone();
        assert_eq!(
            machine.step(&mut clock, &mut console),
            Ok(StepOutcome::Halted)
        );
        assert_eq!(machine, snapshot);
    }

    #[test]
    fn unknown_opcode_faults_with_address_and_byte() {
        let mut machine = Machine::default();
        machine.load(&[LDI, 0, 1, 0b1111_1111]).expect("image fits");
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        machine
            .step(&mut clock, &mut console)
            .expect("LDI executes");
        assert_eq!(
            machine.step(&mut clock, &mut console),
            Err(Fault::UnknownOpcode {
                pc: 3,
                byte: 0b1111_1111
            })
        );
    }

    #[test]
    fn opcode_zero_is_unmapped_execution() {
        let mut machine = Machine::default();
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        assert_eq!(
            machine.step(&mut clock, &mut console),
            Err(Fault::UnknownOpcode { pc: 0, byte: 0 })
        );
    }

    #[test]
    fn operand_byte_outside_register_file_faults() {
        let mut machine = Machine::default();
        machine.load(&[LDI, 9, 1, HLT]).expect("image fits");
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        assert_eq!(
            machine.step(&mut clock, &mut console),
            Err(Fault::RegisterIndexOutOfRange { index: 9 })
        );
    }

    #[test]
    fn push_with_sp_at_bottom_overflows() {
        let mut machine = Machine::default();
        machine.load(&[PUSH, 0]).expect("image fits");
        machine.registers_mut().set_sp(0);
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        assert_eq!(
            machine.step(&mut clock, &mut console),
            Err(Fault::StackOverflow { sp: 0 })
        );
    }

    #[test]
    fn pop_with_sp_past_top_underflows() {
        let mut machine = Machine::default();
        machine.load(&[POP, 0]).expect("image fits");
        machine.registers_mut().set_sp(256);
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        assert_eq!(
            machine.step(&mut clock, &mut console),
            Err(Fault::StackUnderflow { sp: 256 })
        );
    }

    #[test]
    fn fetch_near_the_top_of_memory_wraps_operand_reads() {
        let mut machine = Machine::default();
        machine.memory_mut().write(255, Word::from(HLT));
        machine.set_pc(255);
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        assert_eq!(
            machine.step(&mut clock, &mut console),
            Ok(StepOutcome::Halted)
        );
    }

    #[test]
    fn timer_raises_is_bit_even_while_masked() {
        let mut machine = Machine::new(MachineConfig::default());
        machine.load(&[LDI, 0, 1, HLT]).expect("image fits");
        let mut clock = ManualClock::default();
        clock.advance(Duration::from_secs(1));
        let mut console = BufferConsole::default();

        // IM is 0, so the pending bit must not be serviced.
        assert_eq!(
            machine.step(&mut clock, &mut console),
            Ok(StepOutcome::Executed)
        );
        assert_eq!(machine.registers().is_bits(), 0b0000_0001);
    }

    #[test]
    fn timer_respects_the_configured_interval() {
        let config = MachineConfig {
            timer_interval: Duration::from_millis(10),
        };
        let mut machine = Machine::new(config);
        machine.load(&[LDI, 0, 1, LDI, 1, 2, HLT]).expect("image fits");
        let mut clock = ManualClock::default();
        let mut console = BufferConsole::default();

        machine.step(&mut clock, &mut console).expect("LDI executes");
        assert_eq!(machine.registers().is_bits(), 0);

        clock.advance(Duration::from_millis(10));
        machine.step(&mut clock, &mut console).expect("LDI executes");
        assert_eq!(machine.registers().is_bits(), 0b0000_0001);
    }

    #[test]
    fn trace_reports_pc_window_and_registers() {
        let mut machine = Machine::default();
        machine.load(&[LDI, 0, 8, HLT]).expect("image fits");
        let trace = machine.trace();
        assert!(trace.starts_with("TRACE: 00 | 82 00 08 |"), "{trace}");
        assert!(trace.ends_with("F4"), "{trace}");
    }

    proptest! {
        #[test]
        fn ldi_loads_any_immediate_into_any_general_register(reg in 0_u8..5, imm: u8) {
            let (machine, _) = run_program(&[LDI, reg, imm, HLT]);
            prop_assert_eq!(
                machine.registers().get(reg).expect("index in range"),
                Word::from(imm)
            );
            prop_assert!(machine.run_state().is_halted());
        }

        #[test]
        fn push_then_pop_is_idempotent(value: Word) {
            let mut machine = Machine::default();
            machine.load(&[PUSH, 0, POP, 0, HLT]).expect("image fits");
            machine.registers_mut().set(0, value).expect("index in range");
            let sp_before = machine.registers().sp();

            let mut clock = ManualClock::default();
            let mut console = BufferConsole::default();
            machine.run(&mut clock, &mut console).expect("program runs to HLT");

            prop_assert_eq!(machine.registers().get(0).expect("index in range"), value);
            prop_assert_eq!(machine.registers().sp(), sp_before);
        }
    }

    #[test]
    fn im_and_sp_are_plain_registers_to_the_program() {
        // LDI can retarget IM and SP like any register.
        let (machine, _) = run_program(&[LDI, IM, 3, LDI, SP, 200, HLT]);
        assert_eq!(machine.registers().im(), 3);
        assert_eq!(machine.registers().sp(), 200);
    }
}
