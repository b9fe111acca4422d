use state_machines::state_machine;

state_machine! {
    name: SynthesisMachine,
    state: SynthesisStage,
    initial: Ready,
    states: [Ready, Drafted, Critiqued, Revised],
    events {
        draft { transition: { from: Ready, to: Drafted } }
        critique { transition: { from: Drafted, to: Critiqued } }
        revise { transition: { from: Critiqued, to: Revised } }
    }
}

pub fn ready() -> SynthesisMachine<(), Ready> {
    SynthesisMachine::new(())
}
