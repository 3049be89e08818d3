//! Shuttle control executable entry point.
//!
//! Replays a CSV of recorded sensor rows through the vehicle control module,
//! one row per control cycle, logging the emitted control commands and the
//! instruction completions as the mission plan advances.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::path::Path;

// Internal
use ctrl_lib::{
    route::ScriptedRouteSolver,
    veh_ctrl::{InstructionKind, SensorData, VehCtrl},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // Initialise logger
    logger_init(LevelFilter::Debug, Some(Path::new("ctrl_exec.log")))
        .wrap_err("Failed to initialise logging")?;

    info!("Shuttle Control Executable\n");

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let replay_path = match args.len() {
        2 => args[1].clone(),
        _ => {
            return Err(eyre!(
                "Expected one argument (sensor replay CSV), found {}",
                args.len() - 1
            ))
        }
    };

    // ---- INITIALISE MODULES ----

    let mut veh_ctrl = VehCtrl::default();
    veh_ctrl
        .init("veh_ctrl.toml")
        .wrap_err("Failed to initialise VehCtrl")?;
    info!("VehCtrl init complete");

    // ---- MISSION ASSIGNMENT ----

    // Demo road graph, a single block circuit A -> B -> A
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
    solver.add_route(
        "B",
        "A",
        vec![
            InstructionKind::Forward,
            InstructionKind::Left,
            InstructionKind::Stop,
        ],
        vec!["B1".to_string(), "B2".to_string(), "A".to_string()],
    );

    let mission = vec!["A".to_string(), "B".to_string(), "A".to_string()];
    veh_ctrl
        .set_drive_missions(&mut solver, &mission)
        .wrap_err("Failed to assign the demo mission")?;
    info!("Mission assigned: {:?}\n", mission);

    // ---- REPLAY LOOP ----

    let mut reader = csv::Reader::from_path(&replay_path)
        .wrap_err_with(|| format!("Failed to open replay file {:?}", replay_path))?;

    for (cycle, row) in reader.deserialize().enumerate() {
        let input: SensorData = row.wrap_err("Malformed sensor row")?;

        let (cmd, report) = veh_ctrl
            .proc(&input)
            .wrap_err_with(|| format!("Cycle {} failed", cycle))?;

        info!(
            "cycle {:4}: state={:?} segment={} angle={} lateral={} speed_ref={} mode={:?}",
            cycle,
            veh_ctrl.current_state(),
            veh_ctrl.current_road_segment(),
            cmd.angle,
            cmd.lateral_position,
            cmd.speed_ref,
            cmd.regulation_mode
        );

        if report.no_instruction {
            warn!("cycle {:4}: no drive instruction pending", cycle);
        }

        while let Some(id) = veh_ctrl.pop_finished_instruction_id() {
            info!("cycle {:4}: finished instruction \"{}\"", cycle, id);
        }
    }

    info!("Replay complete");

    Ok(())
}
