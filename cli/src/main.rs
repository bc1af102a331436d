use clap::Parser;
use qgrade_cli::cmd::GlobalArgs;

fn main() {
    init_logger();
    let app = GlobalArgs::parse();
    app.exec_subcmd().unwrap_or_else(|e| {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    });
}

fn init_logger() {
    use colored::Colorize as _;
    use qgrade_core::style::ColorTheme as _;
    use std::io::Write as _;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let level = format!("{:>5}", record.level());
            writeln!(
                buf,
                "{} {}",
                level.color(record.level().color()).bold(),
                record.args()
            )
        })
        .init();
}
