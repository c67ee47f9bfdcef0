use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use simstep::*;
use tokio_util::sync::CancellationToken;

// Granularities of the toy simulation, finest first
#[derive(Grain, Debug, Clone, Copy, PartialEq)]
enum Tick {
    Cycle,
    Trial,
    Epoch,
}

// Simulation state owned by the caller, shared with the pause notifier
#[derive(Default)]
struct Network {
    epoch: usize,
    trial: usize,
    cycle: usize,
    activity: f64,
}

fn simulate(stepper: Stepper<Tick>, net: Arc<Mutex<Network>>) {
    'run: for epoch in 0.. {
        for trial in 0..4 {
            for cycle in 0..25 {
                {
                    let mut net = net.lock().unwrap();
                    net.epoch = epoch;
                    net.trial = trial;
                    net.cycle = cycle;
                    net.activity = 0.9 * net.activity + 0.1 * (cycle as f64).sin().abs();
                }
                if stepper.step_point(&Tick::Cycle) {
                    break 'run;
                }
            }
            if stepper.step_point(&Tick::Trial) {
                break 'run;
            }
        }
        if stepper.step_point(&Tick::Epoch) {
            break 'run;
        }
    }
    tracing::info!("worker finished");
}

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let net = Arc::new(Mutex::new(Network::default()));
    let stepper = Stepper::new(Tick::Cycle, Config::default().with_name("demo"));

    // Runs on the worker thread, lock held: only touch caller-owned state.
    stepper.register_pause_notifier(
        |net: &mut Arc<Mutex<Network>>| {
            let net = net.lock().unwrap();
            println!(
                "paused at epoch {} trial {} cycle {} (activity {:.3})",
                net.epoch, net.trial, net.cycle, net.activity
            );
        },
        net.clone(),
    );

    // Pause on its own whenever activity gets high.
    stepper.register_stop_checker(
        |net: &mut Arc<Mutex<Network>>, grain: &Tick| {
            *grain == Tick::Cycle && net.lock().unwrap().activity > 0.65
        },
        net.clone(),
    );

    let mut watcher = stepper.subscribe();
    stepper.start_stepping(Tick::Cycle, 3);
    let worker = {
        let stepper = stepper.clone();
        let net = net.clone();
        thread::spawn(move || simulate(stepper, net))
    };

    watcher.wait_for(RunState::Paused).await?;

    stepper.enter(RunState::Stepping, 1);
    stepper.set_step_grain(Tick::Trial);
    watcher.wait_for(RunState::Paused).await?;

    // The grain change above was deferred until now.
    stepper.resume();
    watcher.wait_for(RunState::Paused).await?;

    stepper.clear_stop_checker();
    stepper.start_stepping(Tick::Epoch, 2);
    watcher.wait_for(RunState::Paused).await?;

    // Let it run freely for a moment, then shut down via a token.
    let token = CancellationToken::new();
    let stopper = tokio::spawn({
        let stepper = stepper.clone();
        let token = token.clone();
        async move { stepper.stop_on_cancel(token).await }
    });
    stepper.set_running();
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();
    if let Err(e) = stopper.await {
        tracing::error!("stopper task failed: {e}");
    }

    if worker.join().is_err() {
        tracing::error!("worker thread panicked");
    }
    println!("final state: {}", stepper.snapshot().state);
    Ok(())
}
