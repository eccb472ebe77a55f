use std::path::PathBuf;

use moments_core::feed::PostFeed;
use moments_core::models::group_by_month;

use crate::cli::PostCommands;
use crate::commands::common::{
    find_group, format_feed_lines, post_to_item, read_image_upload, resolve_post, short_id,
    CliContext,
};
use crate::error::CliError;

pub async fn run_posts(command: PostCommands, context: &CliContext) -> Result<(), CliError> {
    match command {
        PostCommands::List { group, json } => run_posts_list(&group, json, context).await,
    }
}

async fn run_posts_list(group_name: &str, as_json: bool, context: &CliContext) -> Result<(), CliError> {
    let gateway = context.gateway()?;
    let token = context.resolve_token()?;
    let identity = context.resolve_identity(&token).await?;
    let group = find_group(context, &gateway, &token, &identity, group_name).await?;

    let posts = PostFeed::new(gateway).sync(&token, &identity, &group).await?;

    if as_json {
        let items: Vec<_> = posts.iter().map(post_to_item).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if posts.is_empty() {
        println!("No posts yet in '{}'.", group.name);
    } else {
        for line in format_feed_lines(&group_by_month(&posts)) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_post(
    group_name: &str,
    images: &[PathBuf],
    caption: &str,
    context: &CliContext,
) -> Result<(), CliError> {
    let gateway = context.gateway()?;
    let token = context.resolve_token()?;
    let identity = context.resolve_identity(&token).await?;
    let group = find_group(context, &gateway, &token, &identity, group_name).await?;

    // Read every file up front so a bad path fails before the first upload.
    let uploads = images
        .iter()
        .map(|path| read_image_upload(path))
        .collect::<Result<Vec<_>, _>>()?;

    let created = PostFeed::new(gateway)
        .create(&token, &identity, &group, uploads, caption)
        .await?;

    for post in &created {
        println!("{}", post.id);
    }
    println!("{} post(s) created in '{}'", created.len(), group.name);
    Ok(())
}

pub async fn run_caption(
    group_name: &str,
    post_query: &str,
    caption: &str,
    context: &CliContext,
) -> Result<(), CliError> {
    let gateway = context.gateway()?;
    let token = context.resolve_token()?;
    let identity = context.resolve_identity(&token).await?;
    let group = find_group(context, &gateway, &token, &identity, group_name).await?;

    let post = resolve_post(&gateway, &token, &identity, &group, post_query).await?;
    let updated = PostFeed::new(gateway).edit_caption(&token, &post, caption).await?;
    println!("{}  {}", short_id(&updated.id), updated.caption);
    Ok(())
}

pub async fn run_delete_post(
    group_name: &str,
    post_query: &str,
    context: &CliContext,
) -> Result<(), CliError> {
    let gateway = context.gateway()?;
    let token = context.resolve_token()?;
    let identity = context.resolve_identity(&token).await?;
    let group = find_group(context, &gateway, &token, &identity, group_name).await?;

    let post = resolve_post(&gateway, &token, &identity, &group, post_query).await?;
    PostFeed::new(gateway).delete(&token, &post).await?;
    println!("{}", post.id);
    Ok(())
}
