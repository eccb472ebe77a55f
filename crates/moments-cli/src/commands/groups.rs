use moments_core::directory::GroupDirectory;
use moments_core::models::Group;
use moments_core::store::FileStore;

use crate::cli::{GroupCommands, MemberCommands};
use crate::commands::common::{
    apply_membership, clear_membership, find_group, format_group_lines, group_to_item,
    persist_host, persist_membership, CliContext, Gateway,
};
use crate::error::CliError;

/// Groups the user has left. Leaving is local-only: the provider keeps the
/// folder, so the directory just stops showing it.
const LEFT_GROUPS_KEY: &str = "left-groups";

pub async fn run_groups(command: GroupCommands, context: &CliContext) -> Result<(), CliError> {
    let gateway = context.gateway()?;
    let token = context.resolve_token()?;
    let identity = context.resolve_identity(&token).await?;
    let directory = GroupDirectory::new(gateway.clone());
    let store = context.file_store()?;

    match command {
        GroupCommands::List { json } => {
            let left = left_group_ids(&store)?;
            let mut groups: Vec<Group> = directory
                .bootstrap(&token, &identity)
                .await?
                .into_iter()
                .filter(|group| !left.contains(&group.folder_id))
                .collect();
            for group in &mut groups {
                apply_membership(&store, group)?;
            }

            if json {
                let items: Vec<_> = groups.iter().map(group_to_item).collect();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if groups.is_empty() {
                println!("No groups yet. Create one with `moments groups create <NAME>`.");
            } else {
                for line in format_group_lines(&groups) {
                    println!("{line}");
                }
            }
        }
        GroupCommands::Create { name } => {
            let group = directory.create(&token, &identity, &name).await?;
            persist_host(&store, &group, &identity)?;
            println!("{}  {}", group.id, group.path);
        }
        GroupCommands::Rename { name, new_name } => {
            let group = find_group(context, &gateway, &token, &identity, &name).await?;
            let renamed = directory.rename(&token, &identity, &group, &new_name).await?;
            println!("{}  {}", renamed.id, renamed.path);
        }
        GroupCommands::Delete { name } => {
            let group = find_group(context, &gateway, &token, &identity, &name).await?;
            directory.delete(&token, &identity, &group).await?;
            clear_membership(&store, &group)?;
            println!("Deleted '{}' and its posts", group.name);
        }
        GroupCommands::Leave { name } => {
            let group = find_group(context, &gateway, &token, &identity, &name).await?;
            GroupDirectory::<Gateway>::leave(&group, &identity)?;
            mark_left(&store, &group)?;
            println!("Left '{}'", group.name);
        }
    }

    Ok(())
}

pub async fn run_members(command: MemberCommands, context: &CliContext) -> Result<(), CliError> {
    let gateway = context.gateway()?;
    let token = context.resolve_token()?;
    let identity = context.resolve_identity(&token).await?;
    let store = context.file_store()?;

    match command {
        MemberCommands::List { group } => {
            let group = find_group(context, &gateway, &token, &identity, &group).await?;
            for (index, email) in group.member_emails.iter().enumerate() {
                if index == 0 {
                    println!("{email} (host)");
                } else {
                    println!("{email}");
                }
            }
        }
        MemberCommands::Add { group, email } => {
            let group = find_group(context, &gateway, &token, &identity, &group).await?;
            let updated = GroupDirectory::<Gateway>::add_member(&group, &email)?;
            persist_membership(&store, &updated)?;
            println!("Added {email} to '{}'", updated.name);
        }
        MemberCommands::Remove { group, email } => {
            let group = find_group(context, &gateway, &token, &identity, &group).await?;
            let updated = GroupDirectory::<Gateway>::remove_member(&group, &email)?;
            persist_membership(&store, &updated)?;
            println!("Removed {email} from '{}'", updated.name);
        }
    }

    Ok(())
}

fn left_group_ids(store: &FileStore) -> Result<Vec<String>, CliError> {
    Ok(store.get::<Vec<String>>(LEFT_GROUPS_KEY)?.unwrap_or_default())
}

fn mark_left(store: &FileStore, group: &Group) -> Result<(), CliError> {
    let mut left = left_group_ids(store)?;
    if !left.contains(&group.folder_id) {
        left.push(group.folder_id.clone());
        store.put(LEFT_GROUPS_KEY, &left)?;
    }
    Ok(())
}
