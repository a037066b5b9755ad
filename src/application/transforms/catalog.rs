//! Built-in providers, in registration order.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{Deferred, Follow, Substitute, Transform};
use crate::domain::ports::LinkResolver;

/// Amazon product links, trimmed to the product page.
pub const AMAZON: &str = "amazon";
/// Discord media proxy links, pointed at the CDN.
pub const DISCORD: &str = "discord";
/// Instagram posts and reels.
pub const INSTAGRAM: &str = "instagram";
/// Reddit posts, including share links.
pub const REDDIT: &str = "reddit";
/// Full TikTok video links.
pub const TIKTOK: &str = "tiktok";
/// Short `vm.tiktok.com` links.
pub const TIKTOK_VM: &str = "tiktok-vm";
/// Twitter and X statuses.
pub const TWITTER: &str = "twitter";
/// YouTube Shorts, opened as regular videos.
pub const YOUTUBE_SHORTS: &str = "youtube-shorts";

fn pattern(source: &str) -> Regex {
    Regex::new(source).unwrap_or_else(|e| panic!("invalid built-in pattern {source}: {e}"))
}

static AMAZON_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"https?://([\w.-]+)\.amazon\.(de|com|co\.uk)\S*?/dp/(\w+)"));

static DISCORD_MEDIA_RE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"https?://media\.discordapp\.net/attachments/(\d+)/(\d+)/([^\s|]+)")
});

static DISCORD_GIF_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\.gif(?:\?\S*)?$"));

static INSTAGRAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"https?://(?:www\.)?instagram\.com/reels?/(?P<id>[\w-]+)")
});

static REDDIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"https?://(?:(?:old|www|new)\.)?reddit\.com/(?:r/)+[^/\s|]+/(?:comments/|s/)?\w{5,12}(?:/\w+/)?(?:\w{3,9}/?)?",
    )
});

static TIKTOK_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"https?://(?:www\.)?tiktok\.com/@[^/\s|]+/video/\d+"));

static TIKTOK_VM_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"https?://vm\.tiktok\.com/\w+/?"));

static TIKTOK_DESTINATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"https?://(?:www\.)?tiktok\.com/(?P<username>@[^/\s|]+)/video/(?P<videoId>\d+)")
});

// Deleted or private videos land on the front page or the login wall.
static TIKTOK_DEAD_END_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^https?://(?:www\.)?tiktok\.com/?(?:login\S*)?$"));

static TWITTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"https?://(?P<tld>twitter|x)\.com/(?:#!/)?(\w+)/status(es)?/(\d+)")
});

static YOUTUBE_SHORTS_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"https?://(?:www\.)?youtube\.com/shorts/([\w-]+)"));

const TIKTOK_DESTINATION: &str = "https://www.vxtiktok.com/${username}/video/${videoId}";

/// Resolvers handed to redirect-following providers.
#[derive(Clone)]
pub struct ResolverSet {
    /// Short-deadline resolver for Reddit.
    pub reddit: Arc<dyn LinkResolver>,
    /// Resolver for every other provider.
    pub generic: Arc<dyn LinkResolver>,
}

/// Builds every built-in transform in registration order.
#[must_use]
pub fn default_transforms(resolvers: &ResolverSet) -> Vec<Transform> {
    vec![
        Substitute::new(AMAZON, AMAZON_RE.clone(), "https://$1.amazon.$2/dp/$3").into(),
        Substitute::new(
            DISCORD,
            DISCORD_MEDIA_RE.clone(),
            "https://cdn.discordapp.com/attachments/$1/$2/$3",
        )
        .excluding(DISCORD_GIF_RE.clone())
        .into(),
        Substitute::new(
            INSTAGRAM,
            INSTAGRAM_RE.clone(),
            "https://www.ddinstagram.com/reel/${id}",
        )
        .into(),
        Deferred::new(Follow::new(
            REDDIT,
            REDDIT_RE.clone(),
            Arc::clone(&resolvers.reddit),
        ))
        .replacing("reddit.com/r/", "rxddit.com/r/")
        .into(),
        Follow::new(TIKTOK, TIKTOK_RE.clone(), Arc::clone(&resolvers.generic))
            .with_destination(TIKTOK_DESTINATION_RE.clone(), TIKTOK_DESTINATION)
            .rejecting(TIKTOK_DEAD_END_RE.clone())
            .into(),
        Follow::new(TIKTOK_VM, TIKTOK_VM_RE.clone(), Arc::clone(&resolvers.generic))
            .with_destination(TIKTOK_DESTINATION_RE.clone(), TIKTOK_DESTINATION)
            .rejecting(TIKTOK_DEAD_END_RE.clone())
            .into(),
        Substitute::new(
            TWITTER,
            TWITTER_RE.clone(),
            "https://vxtwitter.com/$2/status/$4",
        )
        .into(),
        Substitute::new(
            YOUTUBE_SHORTS,
            YOUTUBE_SHORTS_RE.clone(),
            "https://www.youtube.com/watch?v=$1",
        )
        .into(),
    ]
}
