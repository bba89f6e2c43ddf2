use super::*;
use clap::CommandFactory;
use clap::Parser;

#[test]
fn cli_debug_assert() {
    Cli::command().debug_assert();
}

#[test]
fn register_parses_with_inline_key() {
    let cli = Cli::try_parse_from([
        "wpdash-child",
        "--site-url",
        "https://example.com",
        "register",
        "--pubkey",
        "ssh-ed25519 AAAA",
        "--server",
        "dash-1",
        "--security-id",
        "abc123",
    ])
    .expect("parse should succeed");

    assert_eq!(cli.global.site_url.as_deref(), Some("https://example.com"));
    match cli.cmd {
        Command::Register(args) => {
            assert_eq!(args.pubkey.as_deref(), Some("ssh-ed25519 AAAA"));
            assert_eq!(args.pubkey_file, None);
            assert_eq!(args.server, "dash-1");
            assert_eq!(args.security_id.as_deref(), Some("abc123"));
        }
        _ => panic!("expected Command::Register"),
    }
}

#[test]
fn register_requires_exactly_one_key_source() {
    assert!(Cli::try_parse_from(["wpdash-child", "register", "--server", "dash-1"]).is_err());
    assert!(Cli::try_parse_from([
        "wpdash-child",
        "register",
        "--server",
        "dash-1",
        "--pubkey",
        "x",
        "--pubkey-file",
        "key.pem",
    ])
    .is_err());
}

#[test]
fn global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "wpdash-child",
        "show",
        "--json",
        "--store",
        "/tmp/options.json",
    ])
    .expect("parse should succeed");

    assert_eq!(
        cli.global.store.as_deref(),
        Some(std::path::Path::new("/tmp/options.json"))
    );
    match cli.cmd {
        Command::Show(args) => assert!(args.json),
        _ => panic!("expected Command::Show"),
    }
}

#[test]
fn handle_and_security_id_parse() {
    let cli = Cli::try_parse_from(["wpdash-child", "handle", "function=generate_manual"])
        .expect("parse should succeed");
    match cli.cmd {
        Command::Handle(args) => assert_eq!(args.query, "function=generate_manual"),
        _ => panic!("expected Command::Handle"),
    }

    let cli = Cli::try_parse_from(["wpdash-child", "security-id"]).expect("parse should succeed");
    assert!(matches!(cli.cmd, Command::SecurityId));

    let cli = Cli::try_parse_from(["wpdash-child", "regenerate", "--dry-run"])
        .expect("parse should succeed");
    match cli.cmd {
        Command::Regenerate(args) => assert!(args.dry_run),
        _ => panic!("expected Command::Regenerate"),
    }
}
