//! Implementations for the VehCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// Internal
use super::{
    ControlCommand, ControlState, DriveInstruction, InstructionKind, Params, RegulationMode,
    VehCtrlError, FAR_DISTANCE, OBSTACLE_FILTER_SEED, STOP_FILTER_SEED,
};
use crate::route::{RouteError, RouteSolver};
use crate::sense::{MeanFilter, StopLineDetector};
use util::{module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vehicle control module state
#[derive(Default)]
pub struct VehCtrl {
    pub(crate) params: Params,

    /// Obstacle distance smoothing filter.
    obstacle_filter: MeanFilter,

    /// Stop distance smoothing filter.
    stop_filter: MeanFilter,

    /// Debounced stop-line decision.
    ///
    /// Stateful, must only be fed where the transition table consults it.
    stop_line_detector: StopLineDetector,

    /// Current control state.
    state: ControlState,

    /// State to resolve to once a `Stopping` deceleration completes.
    stop_reason: ControlState,

    /// Complete the front instruction once the vehicle has fully stopped.
    finish_when_stopped: bool,

    /// Remaining steps of the active mission plan, front = current.
    drive_instructions: VecDeque<DriveInstruction>,

    /// Road segments in lock-step with the instruction queue.
    road_segments: VecDeque<String>,

    /// Mission ids finished but not yet drained by the host.
    finished_id_buffer: VecDeque<String>,

    /// Run length of consecutive healthy image-processing status codes.
    consecutive_ok_codes: u32,

    /// Angle emitted on the previous cycle.
    last_angle: i32,

    report: StatusReport,
}

/// Input data to vehicle control, one set of raw readings per cycle.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct SensorData {
    /// Distance to the nearest obstacle ahead, 0 when nothing is detected.
    ///
    /// Units: sensor distance units
    pub obstacle_distance: i32,

    /// Distance to the next stop line, -1 when no line is detected.
    ///
    /// Units: sensor distance units
    pub stop_distance: i32,

    /// Current vehicle speed.
    ///
    /// Units: sensor speed units
    pub speed: i32,

    /// Line-following angle derived from the left line.
    pub angle_left: i32,

    /// Line-following angle derived from the right line.
    pub angle_right: i32,

    /// Lateral offset from the left line.
    pub lateral_left: i32,

    /// Lateral offset from the right line.
    pub lateral_right: i32,

    /// Image-processing health code, 0 when healthy.
    pub image_status_code: i32,
}

/// Status report for VehCtrl processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// The instruction queue was empty outside of `StopLine`.
    pub no_instruction: bool,

    /// The stop-line detector still fired while waiting at a stop line.
    pub still_at_stop_line: bool,

    /// Number of instructions finished this cycle.
    pub instructions_finished: u8,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for VehCtrl {
    type InitData = &'static str;
    type InitError = VehCtrlError;

    type InputData = SensorData;
    type OutputData = ControlCommand;
    type StatusReport = StatusReport;
    type ProcError = VehCtrlError;

    /// Initialise the VehCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data)?;

        *self = Self::with_params(params);

        info!("VehCtrl initialised");

        Ok(())
    }

    /// Perform cyclic processing of vehicle control.
    ///
    /// Exactly one state-transition evaluation and one command derivation
    /// per call. Anomalies are logged and flagged in the status report, the
    /// cycle itself never fails.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        debug!(
            "obstacle_distance={}, stop_distance={}, speed={}, angles={},{}, status_code={}",
            input_data.obstacle_distance,
            input_data.stop_distance,
            input_data.speed,
            input_data.angle_left,
            input_data.angle_right,
            input_data.image_status_code
        );

        // Normalise "nothing detected" to "nothing to react to" before
        // smoothing
        let stop_distance = match input_data.stop_distance {
            -1 => FAR_DISTANCE,
            d => d,
        };
        let obstacle_distance = match input_data.obstacle_distance {
            0 => FAR_DISTANCE,
            d => d,
        };

        let obstacle_distance = self.obstacle_filter.filtered(obstacle_distance);
        let stop_distance = self.stop_filter.filtered(stop_distance);

        debug!(
            "filtered: obstacle_distance={}, stop_distance={}",
            obstacle_distance, stop_distance
        );

        self.update_state(obstacle_distance, stop_distance, input_data.speed);

        let cmd = ControlCommand {
            regulation_mode: self.choose_regulation_mode(input_data.image_status_code),
            angle: self.calc_angle(input_data.angle_left, input_data.angle_right),
            lateral_position: self
                .calc_lateral_position(input_data.lateral_left, input_data.lateral_right),
            speed_ref: self.calc_speed(),
        };

        debug!(
            "state={:?}, angle={}, lateral={}, speed_ref={}, regulation_mode={:?}",
            self.state, cmd.angle, cmd.lateral_position, cmd.speed_ref, cmd.regulation_mode
        );

        Ok((cmd, self.report))
    }
}

impl VehCtrl {
    /// Build a VehCtrl from an already-loaded parameter set.
    pub fn with_params(params: Params) -> Self {
        let obstacle_filter = MeanFilter::new(params.obstacle_filter_len, OBSTACLE_FILTER_SEED);
        let stop_filter = MeanFilter::new(params.stop_filter_len, STOP_FILTER_SEED);
        let stop_line_detector =
            StopLineDetector::new(params.stop_line_consecutive, params.stop_line_high_count);

        VehCtrl {
            params,
            obstacle_filter,
            stop_filter,
            stop_line_detector,
            ..Default::default()
        }
    }

    // ---- STATE TRANSITIONS ----

    /// Evaluate one state transition from the filtered readings.
    fn update_state(&mut self, obstacle_distance: i32, stop_distance: i32, speed: i32) {
        let front_kind = match self.drive_instructions.front() {
            Some(instr) => instr.kind,
            None => {
                // No instruction pending, bring the vehicle to rest at the
                // line and wait for a new mission
                if self.state != ControlState::StopLine {
                    error!("No drive instruction but state is not StopLine");
                    self.report.no_instruction = true;
                }
                if speed > 0 {
                    self.state = ControlState::Stopping;
                    self.stop_reason = ControlState::StopLine;
                } else {
                    self.state = ControlState::StopLine;
                }
                return;
            }
        };

        match self.state {
            ControlState::Normal | ControlState::Intersection => {
                if self.path_blocked(obstacle_distance) {
                    info!("Path blocked, stopping");
                    self.state = ControlState::Stopping;
                    self.stop_reason = ControlState::Blocked;
                } else if self.stop_line_detector.at_line(stop_distance) {
                    // At a node
                    if self.drive_instructions.len() > 1 {
                        self.finish_instruction();
                        self.set_new_state(speed);
                    } else {
                        // Last instruction, defer completion until the
                        // vehicle has fully stopped
                        info!("At stop line, stopping");
                        self.finish_when_stopped = true;
                        self.state = ControlState::Stopping;
                        self.stop_reason = ControlState::StopLine;
                    }
                } else {
                    // Clear path, no state change
                    debug!("Running");
                }
            }

            ControlState::StopLine => {
                if self.path_blocked(obstacle_distance) {
                    info!("Path blocked");
                    self.state = ControlState::Blocked;
                    return;
                }
                if front_kind == InstructionKind::Stop {
                    self.finish_instruction();
                }
                if self.stop_line_detector.at_line(stop_distance) {
                    // Expected to have cleared by now, log and continue
                    error!("Still at stop line");
                    self.report.still_at_stop_line = true;
                }
                self.set_new_state(speed);
            }

            ControlState::Blocked => {
                if !self.path_blocked(obstacle_distance) {
                    info!("Path no longer blocked");
                    self.set_new_state(speed);
                }
            }

            ControlState::Stopping => {
                if speed == 0 {
                    info!("Stopped");
                    self.state = self.stop_reason;
                    if self.finish_when_stopped {
                        self.finish_instruction();
                        self.finish_when_stopped = false;
                    }
                }
            }
        }
    }

    /// Derive the next state from the front instruction, treating an empty
    /// queue as a `Stop`.
    fn set_new_state(&mut self, speed: i32) {
        let kind = self
            .drive_instructions
            .front()
            .map_or(InstructionKind::Stop, |instr| instr.kind);

        let new_state = match kind {
            InstructionKind::Forward => ControlState::Normal,
            InstructionKind::Left | InstructionKind::Right => ControlState::Intersection,
            InstructionKind::Stop => {
                if speed > 0 {
                    self.stop_reason = ControlState::StopLine;
                    ControlState::Stopping
                } else {
                    ControlState::StopLine
                }
            }
        };

        if new_state != self.state {
            info!("New state: {:?}", new_state);
            self.state = new_state;
        }
    }

    /// Pop the completed front instruction and its road segment, queueing
    /// the mission id for the host to drain.
    ///
    /// The segment list may run empty before the instruction queue, that is
    /// not an error.
    fn finish_instruction(&mut self) {
        let id = match self.drive_instructions.pop_front() {
            Some(instr) => instr.id,
            None => return,
        };

        info!("Finished instruction \"{}\"", id);

        self.road_segments.pop_front();
        self.finished_id_buffer.push_back(id);
        self.report.instructions_finished = self.report.instructions_finished.saturating_add(1);
    }

    /// True when the smoothed obstacle distance is inside the blocking
    /// threshold.
    fn path_blocked(&self, obstacle_distance: i32) -> bool {
        obstacle_distance < self.params.block_distance
    }

    // ---- COMMAND DERIVATION ----

    /// Debounced nominal/critical selection from the image-processing status
    /// code.
    ///
    /// A single bad cycle resets the healthy run, recovery requires a
    /// sustained run of healthy cycles.
    fn choose_regulation_mode(&mut self, status_code: i32) -> RegulationMode {
        if status_code == 0 {
            self.consecutive_ok_codes = self.consecutive_ok_codes.saturating_add(1);
        } else {
            self.consecutive_ok_codes = 0;
        }

        if self.consecutive_ok_codes >= self.params.nominal_mode_threshold {
            RegulationMode::AutoNominal
        } else {
            RegulationMode::AutoCritical
        }
    }

    /// Speed reference for the current state.
    fn calc_speed(&self) -> i32 {
        match self.state {
            ControlState::Normal => self.params.default_speed,
            ControlState::Intersection => self.params.intersection_speed,
            ControlState::StopLine | ControlState::Stopping | ControlState::Blocked => 0,
        }
    }

    /// Lateral position target keyed on the front instruction.
    fn calc_lateral_position(&self, lateral_left: i32, lateral_right: i32) -> i32 {
        match self.drive_instructions.front().map(|instr| instr.kind) {
            Some(InstructionKind::Forward) => (lateral_left + lateral_right) / 2,
            Some(InstructionKind::Left) => lateral_left,
            Some(InstructionKind::Right) => lateral_right,
            Some(InstructionKind::Stop) | None => 0,
        }
    }

    /// Steering angle with single-sensor recovery.
    ///
    /// Straight driving averages both line angles, intersections follow the
    /// turn-side line. The readings sometimes jump abruptly when a detection
    /// is bad. Usually only one side is bad, so a reading outside the
    /// expected bound is discarded in favour of the other side where
    /// possible. With no side to recover with the unreliable value is
    /// accepted rather than stalling.
    fn calc_angle(&mut self, angle_left: i32, angle_right: i32) -> i32 {
        let left_ok = self.is_expected(angle_left);
        let right_ok = self.is_expected(angle_right);

        let angle = match self.drive_instructions.front().map(|instr| instr.kind) {
            Some(InstructionKind::Forward) => {
                if left_ok && right_ok {
                    (angle_left + angle_right) / 2
                } else if left_ok {
                    angle_left
                } else if right_ok {
                    angle_right
                } else {
                    // Could not recover
                    (angle_left + angle_right) / 2
                }
            }
            Some(InstructionKind::Left) => {
                if left_ok {
                    angle_left
                } else if right_ok {
                    angle_right
                } else {
                    // Could not recover
                    angle_left
                }
            }
            Some(InstructionKind::Right) => {
                if right_ok {
                    angle_right
                } else if left_ok {
                    angle_left
                } else {
                    // Could not recover
                    angle_right
                }
            }
            // Not line following, hold the previous angle
            Some(InstructionKind::Stop) | None => self.last_angle,
        };

        self.last_angle = angle;
        angle
    }

    /// True when an angle reading falls inside the plausible bound.
    fn is_expected(&self, angle: i32) -> bool {
        angle.abs() <= self.params.angle_expected_bound
    }

    // ---- MISSION MANAGEMENT ----

    /// Replace the active mission plan.
    ///
    /// `nodes` starts at the vehicle's current position, followed by the
    /// waypoints to visit in order. Each leg is solved by `solver`, with a
    /// stop instruction inserted at every leg boundary so the vehicle halts
    /// between missions. The solver's instruction and segment sequences must
    /// be equal length and index-aligned.
    pub fn set_drive_missions<S: RouteSolver>(
        &mut self,
        solver: &mut S,
        nodes: &[String],
    ) -> Result<(), RouteError> {
        let (first, targets) = match nodes.split_first() {
            Some((first, targets)) => (first, targets),
            None => return Ok(()),
        };
        let mut start = first.clone();

        // Reset position
        self.drive_instructions.clear();
        self.road_segments.clear();

        for target in targets {
            // Stop instruction between missions
            self.add_drive_instruction(InstructionKind::Stop, start.clone());
            self.road_segments.push_back(start.clone());

            solver.solve(&start, target)?;

            // Save the leg, zipping instruction i with segment i
            for (kind, segment) in solver
                .drive_mission()
                .into_iter()
                .zip(solver.road_segments())
            {
                self.add_drive_instruction(kind, segment.clone());
                self.road_segments.push_back(segment);
            }

            start = target.clone();
        }

        info!(
            "Mission plan set: {} instructions over {} segments",
            self.drive_instructions.len(),
            self.road_segments.len()
        );

        Ok(())
    }

    /// Append one instruction to the back of the queue.
    pub fn add_drive_instruction(&mut self, kind: InstructionKind, id: impl Into<String>) {
        self.drive_instructions.push_back(DriveInstruction {
            kind,
            id: id.into(),
        });
    }

    // ---- INTROSPECTION ----

    /// True when at least one finished-instruction id is waiting to be
    /// drained.
    pub fn finished_instruction(&self) -> bool {
        !self.finished_id_buffer.is_empty()
    }

    /// Pop the oldest finished-instruction id, if any.
    pub fn pop_finished_instruction_id(&mut self) -> Option<String> {
        self.finished_id_buffer.pop_front()
    }

    /// Road segment the vehicle is currently on, `"end"` once the plan has
    /// run out of segments.
    pub fn current_road_segment(&self) -> String {
        match self.road_segments.front() {
            Some(segment) => segment.clone(),
            None => String::from("end"),
        }
    }

    /// Front of the instruction queue, if any.
    pub fn current_drive_instruction(&self) -> Option<&DriveInstruction> {
        self.drive_instructions.front()
    }

    /// Current control state.
    pub fn current_state(&self) -> ControlState {
        self.state
    }

    /// Angle emitted on the previous cycle.
    pub fn last_angle(&self) -> i32 {
        self.last_angle
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::route::ScriptedRouteSolver;

    /// Parameters with unit filter windows and thresholds so transitions can
    /// be driven one cycle at a time.
    fn test_params() -> Params {
        Params {
            obstacle_filter_len: 1,
            stop_filter_len: 1,
            stop_line_consecutive: 1,
            stop_line_high_count: 1,
            block_distance: 40,
            angle_expected_bound: 100,
            nominal_mode_threshold: 3,
            default_speed: 30,
            intersection_speed: 15,
        }
    }

    fn test_ctrl() -> VehCtrl {
        VehCtrl::with_params(test_params())
    }

    /// Clear road, no stop line in sight.
    fn far_input(speed: i32) -> SensorData {
        SensorData {
            obstacle_distance: 0,
            stop_distance: -1,
            speed,
            ..Default::default()
        }
    }

    #[test]
    fn test_set_new_state_is_total() {
        let kinds = [
            InstructionKind::Forward,
            InstructionKind::Left,
            InstructionKind::Right,
            InstructionKind::Stop,
        ];

        for &kind in &kinds {
            for &speed in &[0, 10] {
                let mut ctrl = test_ctrl();
                ctrl.add_drive_instruction(kind, "i0");
                ctrl.set_new_state(speed);

                assert!(matches!(
                    ctrl.state,
                    ControlState::Normal
                        | ControlState::Intersection
                        | ControlState::StopLine
                        | ControlState::Stopping
                ));
            }
        }

        // An empty queue derives as a stop
        let mut ctrl = test_ctrl();
        ctrl.set_new_state(0);
        assert_eq!(ctrl.state, ControlState::StopLine);

        let mut ctrl = test_ctrl();
        ctrl.set_new_state(10);
        assert_eq!(ctrl.state, ControlState::Stopping);
        assert_eq!(ctrl.stop_reason, ControlState::StopLine);
    }

    #[test]
    fn test_normal_is_stable_on_clear_road() {
        let mut ctrl = test_ctrl();
        ctrl.add_drive_instruction(InstructionKind::Forward, "i0");

        // First cycle leaves the initial stop line
        ctrl.proc(&far_input(0)).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Normal);

        for _ in 0..10 {
            let (cmd, report) = ctrl.proc(&far_input(30)).unwrap();
            assert_eq!(ctrl.current_state(), ControlState::Normal);
            assert_eq!(cmd.speed_ref, 30);
            assert!(!report.no_instruction);
        }
    }

    #[test]
    fn test_empty_queue_forces_stop() {
        let mut ctrl = test_ctrl();

        // Already waiting at a stop line, no anomaly
        let (cmd, report) = ctrl.proc(&far_input(0)).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::StopLine);
        assert_eq!(cmd.speed_ref, 0);
        assert!(!report.no_instruction);

        // Moving with no instruction is an anomaly, bring the vehicle to
        // rest
        ctrl.state = ControlState::Normal;
        let (cmd, report) = ctrl.proc(&far_input(30)).unwrap();
        assert!(report.no_instruction);
        assert_eq!(ctrl.current_state(), ControlState::Stopping);
        assert_eq!(cmd.speed_ref, 0);

        let (_, _) = ctrl.proc(&far_input(0)).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::StopLine);
    }

    #[test]
    fn test_regulation_mode_hysteresis() {
        let mut ctrl = test_ctrl();
        ctrl.add_drive_instruction(InstructionKind::Forward, "i0");

        let healthy = far_input(0);
        let faulty = SensorData {
            image_status_code: 4,
            ..far_input(0)
        };

        // Threshold is 3 consecutive healthy cycles
        for _ in 0..2 {
            let (cmd, _) = ctrl.proc(&healthy).unwrap();
            assert_eq!(cmd.regulation_mode, RegulationMode::AutoCritical);
        }
        let (cmd, _) = ctrl.proc(&healthy).unwrap();
        assert_eq!(cmd.regulation_mode, RegulationMode::AutoNominal);

        // A single fault resets the run
        let (cmd, _) = ctrl.proc(&faulty).unwrap();
        assert_eq!(cmd.regulation_mode, RegulationMode::AutoCritical);

        for _ in 0..2 {
            let (cmd, _) = ctrl.proc(&healthy).unwrap();
            assert_eq!(cmd.regulation_mode, RegulationMode::AutoCritical);
        }
        let (cmd, _) = ctrl.proc(&healthy).unwrap();
        assert_eq!(cmd.regulation_mode, RegulationMode::AutoNominal);
    }

    #[test]
    fn test_angle_recovery_forward() {
        let mut ctrl = test_ctrl();
        ctrl.add_drive_instruction(InstructionKind::Forward, "i0");

        // Right angle far outside the expected bound, use the left reading
        let input = SensorData {
            angle_left: 10,
            angle_right: 400,
            ..far_input(30)
        };
        let (cmd, _) = ctrl.proc(&input).unwrap();
        assert_eq!(cmd.angle, 10);
        assert_eq!(ctrl.last_angle(), 10);

        // Both plausible, use the average
        let input = SensorData {
            angle_left: 8,
            angle_right: 12,
            ..far_input(30)
        };
        let (cmd, _) = ctrl.proc(&input).unwrap();
        assert_eq!(cmd.angle, 10);

        // Neither plausible, average anyway
        let input = SensorData {
            angle_left: 400,
            angle_right: -400,
            ..far_input(30)
        };
        let (cmd, _) = ctrl.proc(&input).unwrap();
        assert_eq!(cmd.angle, 0);
    }

    #[test]
    fn test_angle_recovery_turning() {
        let mut ctrl = test_ctrl();
        ctrl.add_drive_instruction(InstructionKind::Left, "i0");

        // Left reading bad, recover with the right one
        let input = SensorData {
            angle_left: 400,
            angle_right: 20,
            ..far_input(30)
        };
        let (cmd, _) = ctrl.proc(&input).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Intersection);
        assert_eq!(cmd.angle, 20);

        // Both bad, accept the turn-side value rather than stall
        let input = SensorData {
            angle_left: 400,
            angle_right: 500,
            ..far_input(15)
        };
        let (cmd, _) = ctrl.proc(&input).unwrap();
        assert_eq!(cmd.angle, 400);
    }

    #[test]
    fn test_lateral_position_follows_instruction() {
        let input = SensorData {
            lateral_left: 4,
            lateral_right: 10,
            ..far_input(30)
        };

        let mut ctrl = test_ctrl();
        ctrl.add_drive_instruction(InstructionKind::Forward, "i0");
        let (cmd, _) = ctrl.proc(&input).unwrap();
        assert_eq!(cmd.lateral_position, 7);

        let mut ctrl = test_ctrl();
        ctrl.add_drive_instruction(InstructionKind::Left, "i0");
        let (cmd, _) = ctrl.proc(&input).unwrap();
        assert_eq!(cmd.lateral_position, 4);

        let mut ctrl = test_ctrl();
        ctrl.add_drive_instruction(InstructionKind::Right, "i0");
        let (cmd, _) = ctrl.proc(&input).unwrap();
        assert_eq!(cmd.lateral_position, 10);
    }

    #[test]
    fn test_mission_flattening() {
        let mut solver = ScriptedRouteSolver::new();
        solver.add_route(
            "A",
            "B",
            vec![InstructionKind::Forward],
            vec!["AB".to_string()],
        );
        solver.add_route("B", "C", vec![InstructionKind::Left], vec!["BC".to_string()]);

        let mut ctrl = test_ctrl();
        let nodes = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        ctrl.set_drive_missions(&mut solver, &nodes).unwrap();

        let kinds: Vec<InstructionKind> =
            ctrl.drive_instructions.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InstructionKind::Stop,
                InstructionKind::Forward,
                InstructionKind::Stop,
                InstructionKind::Left,
            ]
        );

        let segments: Vec<String> = ctrl.road_segments.iter().cloned().collect();
        assert_eq!(
            segments,
            vec![
                "A".to_string(),
                "AB".to_string(),
                "B".to_string(),
                "BC".to_string()
            ]
        );

        // Queues are in lock-step
        assert_eq!(ctrl.drive_instructions.len(), ctrl.road_segments.len());
        assert_eq!(ctrl.current_road_segment(), "A");
        assert_eq!(
            ctrl.current_drive_instruction().map(|i| i.kind),
            Some(InstructionKind::Stop)
        );

        // Assigning a new plan replaces the old one
        let nodes = vec!["A".to_string(), "B".to_string()];
        ctrl.set_drive_missions(&mut solver, &nodes).unwrap();
        assert_eq!(ctrl.drive_instructions.len(), 2);
        assert_eq!(ctrl.road_segments.len(), 2);
    }

    #[test]
    fn test_unknown_route_is_propagated() {
        let mut solver = ScriptedRouteSolver::new();
        let mut ctrl = test_ctrl();

        let nodes = vec!["A".to_string(), "B".to_string()];
        assert!(ctrl.set_drive_missions(&mut solver, &nodes).is_err());
    }

    #[test]
    fn test_mission_end_to_end() {
        let mut solver = ScriptedRouteSolver::new();
        solver.add_route(
            "A",
            "B",
            vec![InstructionKind::Forward, InstructionKind::Stop],
            vec!["A1".to_string(), "B".to_string()],
        );

        let mut ctrl = test_ctrl();
        let nodes = vec!["A".to_string(), "B".to_string()];
        ctrl.set_drive_missions(&mut solver, &nodes).unwrap();

        // Leaving the start node completes the inter-mission stop
        ctrl.proc(&far_input(0)).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Normal);
        assert_eq!(ctrl.pop_finished_instruction_id().as_deref(), Some("A"));
        assert_eq!(ctrl.current_road_segment(), "A1");

        // Cruise towards B
        for _ in 0..3 {
            ctrl.proc(&far_input(30)).unwrap();
            assert_eq!(ctrl.current_state(), ControlState::Normal);
        }

        // Reaching the stop line at B completes the forward instruction and
        // starts the deceleration
        let at_line = SensorData {
            obstacle_distance: 0,
            stop_distance: 10,
            speed: 30,
            ..Default::default()
        };
        ctrl.proc(&at_line).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Stopping);
        assert_eq!(ctrl.pop_finished_instruction_id().as_deref(), Some("A1"));

        // Still rolling
        ctrl.proc(&SensorData { speed: 10, ..at_line }).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Stopping);
        assert!(!ctrl.finished_instruction());

        // At rest the stop resolves
        ctrl.proc(&SensorData { speed: 0, ..at_line }).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::StopLine);

        // The final stop instruction completes at the line; the detector
        // still firing there is a logged anomaly, not a failure
        let (_, report) = ctrl.proc(&SensorData { speed: 0, ..at_line }).unwrap();
        assert_eq!(ctrl.pop_finished_instruction_id().as_deref(), Some("B"));
        assert!(report.still_at_stop_line);
        assert_eq!(ctrl.current_road_segment(), "end");
        assert_eq!(ctrl.current_state(), ControlState::StopLine);
        assert!(ctrl.current_drive_instruction().is_none());

        // No further ids are emitted
        assert!(!ctrl.finished_instruction());
    }

    #[test]
    fn test_obstacle_blocks_and_clears() {
        let mut ctrl = test_ctrl();
        ctrl.add_drive_instruction(InstructionKind::Forward, "i0");

        ctrl.proc(&far_input(0)).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Normal);

        // Obstacle inside the blocking threshold
        let blocked = SensorData {
            obstacle_distance: 20,
            stop_distance: -1,
            speed: 30,
            ..Default::default()
        };
        let (cmd, _) = ctrl.proc(&blocked).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Stopping);
        assert_eq!(cmd.speed_ref, 0);

        // Resolves to Blocked once at rest
        ctrl.proc(&SensorData { speed: 0, ..blocked }).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Blocked);

        // Stays blocked while the obstacle remains
        ctrl.proc(&SensorData { speed: 0, ..blocked }).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Blocked);

        // Clears back to the instruction-derived state
        ctrl.proc(&far_input(0)).unwrap();
        assert_eq!(ctrl.current_state(), ControlState::Normal);

        // The instruction was never completed by the blockage
        assert!(!ctrl.finished_instruction());
        assert_eq!(
            ctrl.current_drive_instruction().map(|i| i.kind),
            Some(InstructionKind::Forward)
        );
    }

    #[test]
    fn test_queue_invariants_under_churn() {
        let mut solver = ScriptedRouteSolver::new();
        solver.add_route(
            "A",
            "B",
            vec![
                InstructionKind::Forward,
                InstructionKind::Right,
                InstructionKind::Stop,
            ],
            vec!["A1".to_string(), "A2".to_string(), "B".to_string()],
        );

        let mut ctrl = test_ctrl();
        let nodes = vec!["A".to_string(), "B".to_string()];
        ctrl.set_drive_missions(&mut solver, &nodes).unwrap();

        // Hammer the machine with at-line readings until the plan runs out,
        // then keep going, the queues must never underflow
        let at_line = SensorData {
            obstacle_distance: 0,
            stop_distance: 10,
            speed: 0,
            ..Default::default()
        };
        for _ in 0..20 {
            ctrl.proc(&at_line).unwrap();
            assert!(ctrl.road_segments.len() <= ctrl.drive_instructions.len());
        }

        assert!(ctrl.drive_instructions.is_empty());
        assert_eq!(ctrl.current_road_segment(), "end");

        // Every instruction id came out exactly once, in order
        let mut ids = Vec::new();
        while let Some(id) = ctrl.pop_finished_instruction_id() {
            ids.push(id);
        }
        assert_eq!(ids, vec!["A", "A1", "A2", "B"]);
    }
}
