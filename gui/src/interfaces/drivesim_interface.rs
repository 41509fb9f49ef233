use drivesim::core::input::InputState;
use drivesim::interfaces::gui_interface::GameState;
use flume::{Receiver, Sender};

/// DrivesimInterface connects the GUI to the simulation thread: it drains state snapshots and
/// forwards the polled input flags.
#[derive(Debug)]
pub struct DrivesimInterface {
    pub rx: Receiver<GameState>,
    pub tx_input: Sender<InputState>,
    pub game_state: GameState,
}

impl DrivesimInterface {
    /// update drains the channel and keeps the freshest game state.
    pub fn update(&mut self) {
        for game_state in self.rx.try_iter() {
            self.game_state = game_state;
        }
    }

    /// send_input forwards the polled input flags to the simulation thread. A closed channel is
    /// ignored; the simulation thread has already finished then.
    pub fn send_input(&self, input: InputState) {
        let _ = self.tx_input.send(input);
    }
}
