//! The classic counter: one component, one state slot, a click handler that
//! schedules its own re-render. Rendered against the in-memory host and
//! driven by the standard scheduler in small time slices.

use std::time::Duration;

use weave_core::{use_state, Element, HostError, Props, Renderer, SliceOutcome};
use weave_runtime_std::StdServices;
use weave_testing::MemoryHost;

fn counter(_: &Props) -> Option<Element> {
    let (count, set_count) = use_state(0i64);
    Some(
        Element::host("div")
            .on("onClick", move || set_count.set(|n| n + 1))
            .text_child(format!("Count: {count}")),
    )
}

fn pump(
    renderer: &mut Renderer<MemoryHost>,
    services: &StdServices,
) -> Result<(), HostError> {
    while services.take_work_request() {
        let outcome = renderer.run_slice(&services.deadline(Duration::from_millis(4)))?;
        log::debug!("slice finished: {outcome:?}");
        if outcome == SliceOutcome::Idle {
            break;
        }
    }
    Ok(())
}

fn run() -> Result<(), HostError> {
    let services = StdServices::new();
    let mut renderer = Renderer::with_runtime(MemoryHost::new(), services.runtime());
    let root = renderer.host_mut().create_root();

    renderer.render(Element::component(counter), root);
    pump(&mut renderer, &services)?;
    log::info!("mounted:\n{}", renderer.host().dump_tree(Some(root)));

    let div = renderer.host().node(root).children()[0];
    for click in 1..=3 {
        renderer.host().dispatch(div, "click");
        pump(&mut renderer, &services)?;
        log::info!("after click {click}:\n{}", renderer.host().dump_tree(Some(root)));
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        log::error!("render failed: {err}");
        std::process::exit(1);
    }
}
