/// Demonstrates the fader envelope in both modes: externally terminated
/// (dur = 0, waits for stop) and self terminated (fixed duration).
use modsig::control::{ControlNode, Fader, RenderCtx};

fn main() {
    println!("=== Fader Envelope Sketch ===\n");

    let sample_rate = 48_000.0;
    let ctx = RenderCtx::new(sample_rate);
    let block = 480; // 10ms

    // Externally terminated: sustain until stop().
    let mut fader = Fader::with_times(0.05, 0.2, 0.0).unwrap();
    fader.play();

    println!("dur = 0 (hold until stop):");
    for block_idx in 0..60 {
        if block_idx == 40 {
            fader.stop();
            println!("  -- stop() at t = {:.2}s", block_idx as f32 * 0.01);
        }
        fader.process_block(block, &ctx);
        if block_idx % 10 == 0 {
            let level = *fader.channel(0).last().unwrap();
            println!("  t = {:.2}s  level = {:.3}", (block_idx + 1) as f32 * 0.01, level);
        }
    }

    // Self terminated: the release is scheduled from the duration alone.
    let mut timed = Fader::with_times(0.05, 0.1, 0.4).unwrap();
    timed.play();

    println!("\ndur = 0.4s (self terminating, stop() is ignored):");
    for block_idx in 0..50 {
        if block_idx == 10 {
            timed.stop(); // no effect in this mode
        }
        timed.process_block(block, &ctx);
        if block_idx % 5 == 0 {
            let level = *timed.channel(0).last().unwrap();
            println!("  t = {:.2}s  level = {:.3}", (block_idx + 1) as f32 * 0.01, level);
        }
    }
}
