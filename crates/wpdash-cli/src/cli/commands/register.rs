//! `wpdash-child register` and `wpdash-child regenerate`.

use anyhow::{Context, Result};
use wpdash_enroll::request::decode_pubkey_param;
use wpdash_enroll::{Enrollment, KeyArtifact, RegistrationRequest};

use super::finish;
use crate::cli::args::{RegenerateArgs, RegisterArgs};

pub async fn run(args: RegisterArgs, enrollment: &Enrollment) -> Result<i32> {
    let candidate_key = match (&args.pubkey, &args.pubkey_file) {
        (_, Some(path)) => std::fs::read(path)
            .with_context(|| format!("failed to read public key: {}", path.display()))?,
        (Some(text), None) => decode_pubkey_param(text),
        (None, None) => anyhow::bail!("either --pubkey or --pubkey-file is required"),
    };

    let mut request = RegistrationRequest::new(candidate_key, args.server);
    if let Some(security_id) = args.security_id {
        request = request.with_credential(security_id);
    }

    let result = enrollment.register(&request).await;
    Ok(finish(result, |artifact| print_artifact("Registered", &artifact)))
}

pub async fn run_regenerate(args: RegenerateArgs, enrollment: &Enrollment) -> Result<i32> {
    if args.dry_run {
        let result = enrollment.preview().await;
        return Ok(finish(result, |artifact| {
            print_artifact("Would store", &artifact)
        }));
    }

    let result = enrollment.regenerate().await;
    Ok(finish(result, |artifact| {
        print_artifact("Regenerated", &artifact)
    }))
}

pub(crate) fn print_artifact(verb: &str, artifact: &KeyArtifact) {
    println!("{verb} key for {}", artifact.comment);
    if let Ok(line) = artifact.openssh_text() {
        println!("  {line}");
    }
    if let Ok(fingerprint) = artifact.fingerprint() {
        println!("  fingerprint: {fingerprint}");
    }
    println!("  last sync:   {}", artifact.last_sync());
}
