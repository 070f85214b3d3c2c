use super::ReadinessArgs;
use crate::error::Result;
use crate::readiness::{load_record, score_record};

pub fn handle_readiness(args: &ReadinessArgs) -> Result<()> {
    let record = load_record(&args.profile)?;
    let result = score_record(&record);

    if args.breakdown {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.total);
    }
    Ok(())
}
