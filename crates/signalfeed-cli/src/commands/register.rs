use serde::Serialize;
use signalfeed_core::{Registrar, StudentRegistration};

use crate::cli::RegisterArgs;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Debug, Serialize)]
struct RegisterResponse {
    id: String,
}

pub async fn run(args: &RegisterArgs, context: &Context) -> Result<(), CliError> {
    let mut registration = StudentRegistration::new(&args.login, &args.email);
    if let Some(name) = &args.name {
        registration = registration.with_display_name(name);
    }

    let id = Registrar::new(context.store.clone())
        .register(&registration)
        .await?;

    output::render(&RegisterResponse { id }, context.pretty)
}
