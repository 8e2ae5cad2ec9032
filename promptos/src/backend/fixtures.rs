//! Seed data for demo mode.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Prompt, Role, Space, SpaceKind, User};
use crate::template::extract_variable_names;

pub const DEMO_EMAIL: &str = "root";
pub const DEMO_PASSWORD: &str = "root123";
pub const DEMO_TOKEN: &str = "root-demo-token";
pub const DEMO_CREDITS: u32 = 999;

pub fn demo_user() -> User {
    User {
        id: "root".to_string(),
        name: "Root Admin".to_string(),
        email: "alex@promptos.ai".to_string(),
        avatar: Some("https://picsum.photos/200".to_string()),
        ai_credits: DEMO_CREDITS,
    }
}

pub fn demo_spaces() -> Vec<Space> {
    vec![
        Space {
            id: "s1".to_string(),
            name: "Personal Brain".to_string(),
            kind: SpaceKind::Private,
            description: Some("My private collection of thoughts and drafts.".to_string()),
            join_code: None,
            member_count: 1,
            prompt_count: 12,
            role: Role::Owner,
            icon: "Brain".to_string(),
            color: "text-neon-blue".to_string(),
            created_by: None,
        },
        Space {
            id: "s2".to_string(),
            name: "Marketing Team".to_string(),
            kind: SpaceKind::Team,
            description: Some("Campaign copy, social posts, and email flows.".to_string()),
            join_code: Some("MKT2024".to_string()),
            member_count: 8,
            prompt_count: 45,
            role: Role::Admin,
            icon: "Briefcase".to_string(),
            color: "text-neon-purple".to_string(),
            created_by: None,
        },
        Space {
            id: "s3".to_string(),
            name: "Dev Utilities".to_string(),
            kind: SpaceKind::Public,
            description: Some(
                "Code generation, refactoring, and documentation helpers.".to_string(),
            ),
            join_code: None,
            member_count: 1240,
            prompt_count: 89,
            role: Role::Member,
            icon: "Code".to_string(),
            color: "text-neon-green".to_string(),
            created_by: None,
        },
    ]
}

pub fn demo_prompts(now: DateTime<Utc>) -> Vec<Prompt> {
    vec![
        seeded_prompt(
            "p1",
            "React Component Generator",
            "Act as a senior React engineer. Create a functional component using TypeScript and Tailwind CSS for a [COMPONENT_NAME]. Ensure accessibility compliance and clean code.",
            "Generates clean, production-ready React components.",
            &["coding", "react", "frontend"],
            "s3",
            "u1",
            now,
            true,
            1,
        ),
        seeded_prompt(
            "p2",
            "Cold Email Outreach",
            "Write a cold email to a potential client offering SEO services. Keep it under 150 words, focus on pain points, and include a clear CTA.",
            "High conversion cold email template.",
            &["marketing", "email", "sales"],
            "s2",
            "u2",
            now - Duration::seconds(10_000),
            false,
            2,
        ),
        seeded_prompt(
            "p3",
            "Midjourney Photorealistic",
            "Cinematic shot of [SUBJECT], 8k resolution, photorealistic, depth of field, volumetric lighting, shot on Sony A7R IV --ar 16:9 --v 6.0",
            "Base template for realistic AI photography.",
            &["art", "image-gen", "midjourney"],
            "s1",
            "u1",
            now - Duration::seconds(5_000),
            true,
            1,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn seeded_prompt(
    id: &str,
    title: &str,
    content: &str,
    description: &str,
    tags: &[&str],
    space_id: &str,
    author_id: &str,
    created_at: DateTime<Utc>,
    is_favorite: bool,
    version: u32,
) -> Prompt {
    Prompt {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        space_id: space_id.to_string(),
        author_id: author_id.to_string(),
        created_at,
        updated_at: created_at,
        is_favorite,
        version,
        variables: extract_variable_names(content),
    }
}
