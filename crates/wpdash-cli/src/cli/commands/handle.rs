//! `wpdash-child handle` - process a raw inbound request.

use anyhow::Result;
use wpdash_enroll::{handle, Enrollment, InboundCall, Outcome};

use super::finish;
use super::register::print_artifact;
use crate::cli::args::HandleArgs;

pub async fn run(args: HandleArgs, enrollment: &Enrollment) -> Result<i32> {
    let call = InboundCall::from_query(&args.query);
    let result = handle(enrollment, call).await;

    Ok(finish(result, |outcome| match outcome {
        Outcome::Registered(artifact) => print_artifact("Registered", &artifact),
        Outcome::Regenerated(artifact) => print_artifact("Regenerated", &artifact),
        Outcome::Ignored => println!("Ignored: not an enrollment call"),
    }))
}
