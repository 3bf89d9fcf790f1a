//! End-to-end programs in the textual format, loaded and run to `HLT`.

use proptest as _;
use rstest as _;
use thiserror as _;

use ls8_core::{parse_program, BufferConsole, LoadError, Machine, ManualClock};

fn run_source(source: &str) -> (Machine, BufferConsole) {
    let image = parse_program(source).expect("program is well formed");
    let mut machine = Machine::default();
    machine.load(&image).expect("image fits in memory");
    let mut clock = ManualClock::default();
    let mut console = BufferConsole::default();
    machine
        .run(&mut clock, &mut console)
        .expect("program runs to HLT");
    (machine, console)
}

#[test]
fn print8_prints_8_and_halts() {
    let (machine, console) = run_source(
        "\
# print8.ls8
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
",
    );

    assert_eq!(console.contents(), "8\n");
    assert!(machine.run_state().is_halted());
    assert_eq!(machine.registers().get(0).expect("index in range"), 8);
}

#[test]
fn mult_prints_27() {
    let (_, console) = run_source(
        "\
# mult.ls8: 9 * 3
10000010 # LDI R0,9
00000000
00001001
10000010 # LDI R1,3
00000001
00000011
10100010 # MUL R0,R1
00000000
00000001
01000111 # PRN R0
00000000
00000001 # HLT
",
    );

    assert_eq!(console.contents(), "27\n");
}

#[test]
fn pra_prints_characters_without_newlines() {
    // Prints "Hi" then a newline character, all via PRA.
    let (_, console) = run_source(
        "\
10000010 # LDI R0,72  'H'
00000000
01001000
01001000 # PRA R0
00000000
10000010 # LDI R0,105 'i'
00000000
01101001
01001000 # PRA R0
00000000
10000010 # LDI R0,10  '\\n'
00000000
00001010
01001000 # PRA R0
00000000
00000001 # HLT
",
    );

    assert_eq!(console.contents(), "Hi\n");
}

#[test]
fn call_and_ret_nest_through_the_stack() {
    // main calls a subroutine that doubles R1 via ADD, then prints.
    let (machine, console) = run_source(
        "\
10000010 # LDI R1,21
00000001
00010101
10000010 # LDI R0,11  subroutine address
00000000
00001011
01010000 # CALL R0
00000000
01000111 # PRN R1
00000001
00000001 # HLT
10100000 # ADD R1,R1   <- subroutine
00000001
00000001
00010001 # RET
",
    );

    assert_eq!(console.contents(), "42\n");
    assert_eq!(machine.registers().sp(), ls8_core::SP_BOOT);
}

#[test]
fn malformed_program_fails_before_execution() {
    let err = parse_program("10000010\n00000000\n2\n").expect_err("token 2 is not binary");
    assert!(matches!(err, LoadError::MalformedLine { line: 3, .. }));
}
