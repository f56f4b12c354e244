pub fn print_banner(version: &str) {
    let banner = format!(
        r#"
 ████████╗██╗   ██╗██████╗ ███████╗
 ╚══██╔══╝██║   ██║██╔══██╗██╔════╝    tubefeed
    ██║   ██║   ██║██████╔╝█████╗      v{}
    ██║   ██║   ██║██╔══██╗██╔══╝
    ██║   ╚██████╔╝██████╔╝███████╗
    ╚═╝    ╚═════╝ ╚═════╝ ╚══════╝
"#,
        version
    );

    tracing::info!("{}", banner);
}
