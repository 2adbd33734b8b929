/// Demonstrates asymmetric portamento and a click-free input swap: a Port
/// smooths a stepping control value, then its source is replaced mid-run
/// with a crossfade.
use modsig::{
    control::{ControlNode, Port, RenderCtx},
    param::{Sig, SignalRef},
};

fn main() {
    println!("=== Portamento Sketch ===\n");

    let sample_rate = 48_000.0;
    let ctx = RenderCtx::new(sample_rate);
    let block = 480; // 10ms

    let pitch = Sig::new(0.0);
    let input = SignalRef::new(pitch.clone());
    let mut port = Port::with_times(input, 0.05, 0.3).unwrap();

    println!("risetime 0.05s, falltime 0.3s:");
    for block_idx in 0..80 {
        match block_idx {
            10 => {
                pitch.set_value(1.0);
                println!("  -- step up to 1.0");
            }
            40 => {
                pitch.set_value(0.0);
                println!("  -- step down to 0.0 (slower fall)");
            }
            60 => {
                let replacement = SignalRef::new(Sig::new(0.5));
                port.set_input(replacement, 0.1).unwrap();
                println!("  -- input swapped, 0.1s crossfade");
            }
            _ => {}
        }

        port.process_block(block, &ctx);
        if block_idx % 5 == 0 {
            let y = *port.channel(0).last().unwrap();
            println!("  t = {:.2}s  out = {:.3}", (block_idx + 1) as f32 * 0.01, y);
        }
    }
}
