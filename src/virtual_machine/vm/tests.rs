use super::*;
use crate::utils::test_utils::utils::*;

fn loaded(words: &[Word]) -> Vm {
    Vm::from_program(&program(words))
}

// ==================== Arithmetic ====================

#[test]
fn add_and_multiply_in_position_mode() {
    assert_eq!(final_memory(&[1, 0, 0, 0, 99]), vec![2, 0, 0, 0, 99]);
    assert_eq!(final_memory(&[2, 3, 0, 3, 99]), vec![2, 3, 0, 6, 99]);
    assert_eq!(final_memory(&[2, 4, 4, 5, 99, 0]), vec![2, 4, 4, 5, 99, 9801]);
    assert_eq!(
        final_memory(&[1, 1, 1, 4, 99, 5, 6, 0, 99]),
        vec![30, 1, 1, 4, 2, 5, 6, 0, 99]
    );
    assert_eq!(
        final_memory(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]),
        vec![3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]
    );
}

#[test]
fn immediate_mode_parameters() {
    assert_eq!(final_memory(&[1002, 4, 3, 4, 33]), vec![1002, 4, 3, 4, 99]);
    assert_eq!(final_memory(&[1101, 100, -1, 4, 0]), vec![1101, 100, -1, 4, 99]);
}

#[test]
fn patched_noun_and_verb() {
    let mut vm = loaded(&[1, 0, 0, 0, 99, 7, 8]);
    vm.write(1, 5).unwrap();
    vm.write(2, 6).unwrap();
    vm.run_to_halt().unwrap();
    assert_eq!(vm.read(0).unwrap(), 15);
}

#[test]
fn large_integers_are_not_truncated() {
    assert_eq!(run_with_inputs(LARGE_PRODUCT, &[]), vec![1219070632396864]);
    assert_eq!(run_with_inputs(LARGE_LITERAL, &[]), vec![1125899906842624]);
}

// ==================== I/O ====================

#[test]
fn echo_outputs_its_input() {
    for value in [0, 42, -7, Word::MAX] {
        assert_eq!(run_with_inputs(&[3, 0, 4, 0, 99], &[value]), vec![value]);
    }
}

#[test]
fn comparisons() {
    for (input, eq, lt) in [(-1, 0, 1), (0, 0, 1), (7, 0, 1), (8, 1, 0), (9, 0, 0)] {
        assert_eq!(run_with_inputs(EQUALS_EIGHT_POSITION, &[input]), vec![eq]);
        assert_eq!(run_with_inputs(EQUALS_EIGHT_IMMEDIATE, &[input]), vec![eq]);
        assert_eq!(run_with_inputs(LESS_THAN_EIGHT_POSITION, &[input]), vec![lt]);
        assert_eq!(run_with_inputs(LESS_THAN_EIGHT_IMMEDIATE, &[input]), vec![lt]);
    }
}

#[test]
fn jumps() {
    for (input, expected) in [(0, 0), (1, 1), (-5, 1)] {
        assert_eq!(run_with_inputs(JUMP_POSITION, &[input]), vec![expected]);
        assert_eq!(run_with_inputs(JUMP_IMMEDIATE, &[input]), vec![expected]);
    }
}

#[test]
fn compare_to_eight() {
    assert_eq!(run_with_inputs(COMPARE_TO_EIGHT, &[5]), vec![999]);
    assert_eq!(run_with_inputs(COMPARE_TO_EIGHT, &[8]), vec![1000]);
    assert_eq!(run_with_inputs(COMPARE_TO_EIGHT, &[12]), vec![1001]);
}

#[test]
fn quine_reproduces_itself() {
    assert_eq!(run_with_inputs(QUINE, &[]), QUINE.to_vec());
}

#[test]
fn relative_base_addressing() {
    // rb = 2000 + 19, then output [rb-34] at 1985.
    let mut vm = loaded(&[109, 2000, 109, 19, 204, -34, 99]);
    vm.write(1985, 77).unwrap();
    assert_eq!(vm.run_to_halt().unwrap(), vec![77]);
    assert_eq!(vm.relative_base(), 2019);
}

#[test]
fn relative_mode_store() {
    // in [rb+5] with rb = 3, then out [8]
    let mut vm = loaded(&[109, 3, 203, 5, 4, 8, 99]);
    vm.push_input(11);
    assert_eq!(vm.run_to_halt().unwrap(), vec![11]);
}

#[test]
fn pop_output_on_empty_channel() {
    let vm = loaded(&[99]);
    assert_eq!(vm.pop_output(), Err(ChannelError::Empty));
}

#[test]
fn outputs_queue_in_order() {
    let mut vm = loaded(&[104, 1, 104, 2, 104, 3, 99]);
    assert_eq!(vm.run().unwrap(), MachineState::Halted);
    assert_eq!(vm.pop_output(), Ok(1));
    assert_eq!(vm.drain_output(), vec![2, 3]);
    assert_eq!(vm.profile().outputs(), 3);
}

// ==================== Memory ====================

#[test]
fn stores_past_end_grow_memory() {
    let mut vm = loaded(&[1101, 2, 3, 10, 99]);
    vm.run().unwrap();
    let memory = vm.memory_snapshot();
    assert_eq!(memory.len(), 11);
    assert_eq!(memory[10], 5);
    assert!(memory[5..10].iter().all(|&w| w == 0));
}

#[test]
fn reads_past_end_are_zero_and_do_not_grow() {
    let mut vm = loaded(&[4, 1000, 99]);
    assert_eq!(vm.run_to_halt().unwrap(), vec![0]);
    assert_eq!(vm.memory_snapshot().len(), 3);
}

#[test]
fn extended_limits_preallocate() {
    let mut vm = Vm::with_limits(Limits::extended());
    vm.load(&program(&[99]));
    assert_eq!(vm.memory_snapshot().len(), EXTENDED_MEMORY_SIZE);
}

#[test]
fn self_modifying_code() {
    // Rewrites the halt at address 4 into an immediate output.
    let mut vm = loaded(&[1101, 100, 4, 4, 99, 5, 99]);
    assert_eq!(vm.run_to_halt().unwrap(), vec![5]);
}

#[test]
fn read_and_write_reject_negative_addresses() {
    let mut vm = loaded(&[99]);
    assert_eq!(
        vm.read(-1),
        Err(VMError::InvalidAddress { address: -1 })
    );
    assert_eq!(
        vm.write(-3, 1),
        Err(VMError::InvalidAddress { address: -3 })
    );
    // Host access never faults the machine itself.
    assert!(vm.fault().is_none());
    assert_eq!(vm.run_to_halt().unwrap(), Vec::<Word>::new());
}

// ==================== Scheduling ====================

#[test]
fn blocks_on_empty_input_and_resumes() {
    let mut vm = loaded(&[3, 0, 4, 0, 99]);
    assert_eq!(vm.run().unwrap(), MachineState::Blocked);
    assert_eq!(vm.state(), MachineState::Blocked);
    assert_eq!(vm.pc(), 0);
    assert_eq!(vm.steps(), 0);

    // retrying without input changes nothing
    assert_eq!(vm.run().unwrap(), MachineState::Blocked);
    assert_eq!(vm.memory_snapshot(), vec![3, 0, 4, 0, 99]);

    vm.push_input(13);
    assert_eq!(vm.run().unwrap(), MachineState::Halted);
    assert_eq!(vm.drain_output(), vec![13]);
    assert_eq!(vm.profile().inputs(), 1);
}

#[test]
fn step_executes_one_instruction() {
    let mut vm = loaded(&[1101, 1, 1, 0, 104, 5, 99]);
    assert_eq!(vm.step().unwrap(), MachineState::Running);
    assert_eq!(vm.pc(), 4);
    assert_eq!(vm.read(0).unwrap(), 2);
    assert_eq!(vm.step().unwrap(), MachineState::Running);
    assert_eq!(vm.output().snapshot(), vec![5]);
    assert_eq!(vm.step().unwrap(), MachineState::Halted);
    assert_eq!(vm.steps(), 3);
}

#[test]
fn halted_machine_is_idempotent() {
    let mut vm = loaded(&[104, 9, 99]);
    assert_eq!(vm.run().unwrap(), MachineState::Halted);
    let memory = vm.memory_snapshot();
    let pc = vm.pc();
    let outputs = vm.output().snapshot();

    for _ in 0..3 {
        assert_eq!(vm.run().unwrap(), MachineState::Halted);
        assert_eq!(vm.step().unwrap(), MachineState::Halted);
    }
    assert_eq!(vm.memory_snapshot(), memory);
    assert_eq!(vm.pc(), pc);
    assert_eq!(vm.output().snapshot(), outputs);
}

#[test]
fn run_to_halt_reports_starvation() {
    let mut vm = loaded(&[3, 0, 3, 1, 99]);
    vm.push_input(1);
    assert_eq!(vm.run_to_halt(), Err(VMError::InputExhausted { pc: 2 }));
    assert_eq!(vm.state(), MachineState::Blocked);

    // not latched: the machine can still finish
    vm.push_input(2);
    assert_eq!(vm.run_to_halt(), Ok(vec![]));
    assert_eq!(&vm.memory_snapshot()[..2], &[1, 2]);
}

#[test]
fn rebound_input_reads_upstream_output() {
    let mut producer = loaded(&[104, 21, 99]);
    let mut consumer = loaded(&[3, 0, 4, 0, 99]);
    consumer.rebind_input(&producer);
    assert!(consumer.input().is_shared_with(producer.output()));

    assert_eq!(consumer.run().unwrap(), MachineState::Blocked);
    producer.run().unwrap();
    assert_eq!(consumer.run().unwrap(), MachineState::Halted);
    assert_eq!(consumer.drain_output(), vec![21]);
    assert!(producer.output().is_empty());
}

#[test]
fn load_resets_state_but_keeps_wiring() {
    let upstream = loaded(&[99]);
    let mut vm = loaded(&[109, 5, 104, 1, 99]);
    vm.rebind_input(&upstream);
    vm.run().unwrap();
    upstream.output().push(3);

    vm.load(&program(&[3, 0, 99]));
    assert_eq!(vm.pc(), 0);
    assert_eq!(vm.relative_base(), 0);
    assert_eq!(vm.state(), MachineState::Running);
    assert_eq!(vm.steps(), 0);
    assert_eq!(vm.profile().total(), 0);
    assert!(vm.output().is_empty());
    assert!(vm.input().is_empty());
    assert!(vm.input().is_shared_with(upstream.output()));
}

// ==================== Faults ====================

#[test]
fn invalid_opcode() {
    let mut vm = loaded(&[1101, 1, 1, 5, 98]);
    assert_eq!(
        vm.run(),
        Err(VMError::InvalidOpcode { opcode: 98, pc: 4 })
    );
}

#[test]
fn negative_word_is_invalid_opcode() {
    let mut vm = loaded(&[-1]);
    assert_eq!(vm.run(), Err(VMError::InvalidOpcode { opcode: -1, pc: 0 }));
}

#[test]
fn empty_program_faults_on_opcode_zero() {
    let mut vm = Vm::new();
    assert_eq!(vm.run(), Err(VMError::InvalidOpcode { opcode: 0, pc: 0 }));
}

#[test]
fn invalid_mode() {
    let mut vm = loaded(&[301, 0, 0, 0, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::InvalidMode {
            mode: 3,
            param: 0,
            pc: 0
        })
    );
}

#[test]
fn immediate_write_target() {
    let mut vm = loaded(&[11101, 1, 1, 0, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::ImmediateWrite { param: 2, pc: 0 })
    );
}

#[test]
fn negative_address() {
    let mut vm = loaded(&[4, -1, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::NegativeAddress { address: -1, pc: 0 })
    );

    let mut vm = loaded(&[109, -10, 204, 3, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::NegativeAddress { address: -7, pc: 2 })
    );
}

#[test]
fn negative_jump_target() {
    let mut vm = loaded(&[1105, 1, -4, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::NegativeAddress { address: -4, pc: 0 })
    );
}

#[test]
fn untaken_jump_still_resolves_its_target() {
    // Condition 0 falls through, but the positional target -1 is unreadable.
    let mut vm = loaded(&[105, 0, -1, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::NegativeAddress { address: -1, pc: 0 })
    );

    // An immediate negative target is only an error once taken.
    let mut vm = loaded(&[1105, 0, -1, 99]);
    assert_eq!(vm.run(), Ok(MachineState::Halted));
}

#[test]
fn products_beyond_64_bits() {
    let big = Word::from(i64::MAX);
    let mut vm = loaded(&[1102, big, 4, 7, 4, 7, 99, 0]);
    assert_eq!(vm.run_to_halt().unwrap(), vec![big * 4]);
}

#[test]
fn arithmetic_overflow() {
    let mut vm = loaded(&[1102, Word::MAX, 2, 0, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::ArithmeticOverflow {
            instruction: "MUL",
            pc: 0
        })
    );

    let mut vm = loaded(&[1101, Word::MAX, 1, 0, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::ArithmeticOverflow {
            instruction: "ADD",
            pc: 0
        })
    );

    let mut vm = loaded(&[109, Word::MAX, 109, 1, 99]);
    assert_eq!(
        vm.run(),
        Err(VMError::ArithmeticOverflow {
            instruction: "ARB",
            pc: 2
        })
    );
}

#[test]
fn memory_limit() {
    let mut vm = Vm::with_limits(Limits::default().with_max_memory(64));
    vm.load(&program(&[1101, 1, 1, 64, 99]));
    assert_eq!(
        vm.run(),
        Err(VMError::MemoryLimitExceeded {
            address: 64,
            limit: 64
        })
    );
}

#[test]
fn step_limit_stops_infinite_loops() {
    let mut vm = Vm::with_limits(Limits::default().with_max_steps(10));
    vm.load(&program(&[1105, 1, 0]));
    assert_eq!(vm.run(), Err(VMError::StepLimitExceeded { limit: 10 }));
    assert_eq!(vm.steps(), 10);
    assert_eq!(vm.profile().count(Opcode::JumpIfTrue), 10);
}

#[test]
fn faults_are_latched_until_load() {
    let mut vm = loaded(&[104, 1, 42]);
    let fault = VMError::InvalidOpcode { opcode: 42, pc: 2 };
    assert_eq!(vm.run(), Err(fault.clone()));
    assert_eq!(vm.fault(), Some(&fault));

    let memory = vm.memory_snapshot();
    assert_eq!(vm.step(), Err(fault.clone()));
    assert_eq!(vm.run(), Err(fault));
    assert_eq!(vm.memory_snapshot(), memory);
    assert_eq!(vm.drain_output(), vec![1]);

    vm.load(&program(&[99]));
    assert_eq!(vm.fault(), None);
    assert_eq!(vm.run(), Ok(MachineState::Halted));
}

// ==================== Profile ====================

#[test]
fn profile_counts_executed_instructions() {
    let mut vm = loaded(&[3, 0, 1, 0, 0, 0, 4, 0, 99]);
    vm.push_input(4);
    assert_eq!(vm.run_to_halt().unwrap(), vec![8]);

    let profile = vm.profile();
    assert_eq!(profile.count(Opcode::Input), 1);
    assert_eq!(profile.count(Opcode::Add), 1);
    assert_eq!(profile.count(Opcode::Output), 1);
    assert_eq!(profile.count(Opcode::Halt), 1);
    assert_eq!(profile.total(), 4);
    assert_eq!(profile.total(), vm.steps());
}
