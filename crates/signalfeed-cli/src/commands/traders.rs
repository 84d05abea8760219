use signalfeed_core::Trader;

use crate::error::CliError;
use crate::output;

use super::Context;

pub fn run(context: &Context) -> Result<(), CliError> {
    let traders: Vec<&Trader> = context.roster.iter().collect();
    output::render(&traders, context.pretty)
}
