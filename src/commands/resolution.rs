use chrono::Utc;

use super::{CreateArgs, ResolutionCommand, VoteArgs};
use crate::db::Database;
use crate::error::Result;
use crate::models::{Resolution, ResolutionStatus, Vote, VoteChoice, VotingType};
use crate::voting::tally::Tally;
use crate::voting::workflow::ResolutionWorkflow;

pub async fn handle_resolution_command(
    database: &Database,
    workflow: &ResolutionWorkflow,
    command: ResolutionCommand,
) -> Result<()> {
    match command {
        ResolutionCommand::Create(args) => handle_create(database, args).await,
        ResolutionCommand::Open { id } => {
            let opened = database.open_resolution(&id, workflow, Utc::now()).await?;
            println!("Resolution {} is open for voting.", opened.id);
            Ok(())
        }
        ResolutionCommand::Vote(args) => handle_vote(database, args).await,
        ResolutionCommand::Close { id } => {
            let decision = database.close_resolution(&id, workflow, Utc::now()).await?;
            println!("{}", decision.results.summary);
            Ok(())
        }
        ResolutionCommand::Show { id } => handle_show(database, &id).await,
        ResolutionCommand::List { status } => {
            let status = status.map(|s| s.parse::<ResolutionStatus>()).transpose()?;
            for resolution in database.list_resolutions(status).await? {
                println!(
                    "{}  {:<7} {:<15} {}",
                    resolution.id, resolution.status, resolution.voting_type, resolution.title
                );
            }
            Ok(())
        }
    }
}

async fn handle_create(database: &Database, args: CreateArgs) -> Result<()> {
    let voting_type: VotingType = args.voting_type.parse()?;
    let resolution = Resolution::new(
        args.meeting_id,
        args.title,
        args.description,
        voting_type,
        args.quorum,
        args.deadline_minutes,
    )?;
    database.create_resolution(&resolution).await?;
    println!("{}", resolution.id);
    Ok(())
}

async fn handle_vote(database: &Database, args: VoteArgs) -> Result<()> {
    // Reject malformed choices before touching the store
    let choice: VoteChoice = args.choice.parse()?;
    let vote = Vote::new(args.id, args.voter, choice, args.comment);
    database.cast_vote(&vote).await?;
    println!("Recorded {} vote from {}.", vote.choice, vote.voter_id);
    Ok(())
}

async fn handle_show(database: &Database, id: &str) -> Result<()> {
    let resolution = database.get_resolution(id).await?;
    let votes = database.get_resolution_votes(id).await?;
    let tally = Tally::from_votes(&votes);

    println!("{}", serde_json::to_string_pretty(&resolution)?);
    println!(
        "Approve: {}  Reject: {}  Abstain: {}  (quorum {} of {})",
        tally.approve,
        tally.reject,
        tally.abstain,
        tally.total_voters(),
        resolution.quorum_required
    );
    for vote in votes.iter().filter(|v| v.comment.is_some()) {
        println!("- {} ({}): {}", vote.voter_id, vote.choice, vote.comment.as_deref().unwrap_or_default());
    }
    Ok(())
}
