use std::panic;

use log::error;

/// Install the process panic hook.
///
/// Debug builds get full `better-panic` backtraces; release builds write a
/// crash report through `human-panic` instead. Either way the panic is also
/// recorded in the log file before the default hook runs.
pub fn initialize_panic_handler() {
    #[cfg(debug_assertions)]
    better_panic::install();

    #[cfg(not(debug_assertions))]
    human_panic::setup_panic!();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        error!("Panic: {panic_info}");
        log::logger().flush();

        default_hook(panic_info);

        std::process::exit(1);
    }));
}
