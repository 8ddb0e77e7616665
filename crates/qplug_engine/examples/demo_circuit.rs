//! QPLUG demo circuits
//!
//! Runs the built-in demo templates on every backend kind and prints the
//! negotiated capabilities, the estimates, and any submitted jobs.

use qplug_engine::prelude::*;
use std::f64::consts::PI;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("╔══════════════════════════════════════════════════════════════════════╗");
    println!("║                     QPLUG Demo Circuit Report                        ║");
    println!("╚══════════════════════════════════════════════════════════════════════╝\n");

    let params = [PI / 3.0, PI / 5.0];
    println!("Parameters: {:?}\n", params);

    for kind in BackendKind::ALL {
        let config = PluginConfig::for_backend(kind.name())
            .with_seed(42)
            .with_num_runs(256);
        let mut session = init_plugin(kind.name(), config)?;

        println!("═══════════════════════════════════════════════════════════════════════");
        println!("  {}", session);
        println!("═══════════════════════════════════════════════════════════════════════");
        println!("  gates:       {:?}", session.capabilities().gate_names());
        println!("  observables: {:?}", session.capabilities().observable_names());

        for name in ["demo_ev0", "demo_ev1"] {
            match session.execute_template(name, &params) {
                Ok(Some(out)) => println!("  {:<9} → {}", name, out[0]),
                Ok(None) => println!("  {:<9} → (no outputs)", name),
                Err(e) => println!("  {:<9} ✗ {}", name, e),
            }
        }

        // The classical engine only accepts basis-preserving gates
        let flip = TemplateBuilder::new("flip")
            .x(0)
            .cnot(0, 1)
            .expval_z(1)
            .output(&[1])
            .build()?;
        match session.execute_circuit(&flip, &[], true, None) {
            Ok(Some(out)) => println!("  {:<9} → {}", flip.name(), out[0]),
            Ok(None) => println!("  {:<9} → (no outputs)", flip.name()),
            Err(e) => println!("  {:<9} ✗ {}", flip.name(), e),
        }

        for id in session.jobs().ids()? {
            if let Some(job) = session.jobs().get(&id)? {
                println!(
                    "  job {} on {}: {} shots, {:?}",
                    job.id, job.device, job.shots, job.status
                );
            }
        }

        session.shutdown()?;
        println!();
    }

    Ok(())
}
