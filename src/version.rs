pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn print_version_info() {
    println!("marionette {}", VERSION);

    // These variables are set by build.rs when it can find them
    if let Some(info) = option_env!("MARIONETTE_BUILD_COMMIT_HASH") {
        println!("build commit: {}", info);
    }
    if let Some(info) = option_env!("MARIONETTE_BUILD_COMPILE_DATE") {
        println!("compile date: {}", info);
    }
}
