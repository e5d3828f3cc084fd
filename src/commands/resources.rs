use anyhow::Result;
use async_trait::async_trait;

use crate::commands::Command;
use crate::platform::IncomingMessage;

/// A single helpful link
#[derive(Debug)]
pub struct Resource {
    pub title: &'static str,
    pub url: &'static str,
    /// Sub-heading printed above this entry
    pub label: Option<&'static str>,
}

/// A titled group of resources
#[derive(Debug)]
pub struct ResourceCategory {
    pub name: &'static str,
    pub resources: &'static [Resource],
}

const fn link(title: &'static str, url: &'static str) -> Resource {
    Resource {
        title,
        url,
        label: None,
    }
}

const fn labelled(label: &'static str, title: &'static str, url: &'static str) -> Resource {
    Resource {
        title,
        url,
        label: Some(label),
    }
}

/// Curated list of resources related to game development
pub static CATALOG: &[ResourceCategory] = &[
    ResourceCategory {
        name: "GML Written Articles:",
        resources: &[
            link("GMS1.x Documentation", "http://docs.yoyogames.com/"),
            link("GMS2 Documentation", "http://docs2.yoyogames.com/"),
            labelled(
                "Detailed Shader Basics:",
                "Xor Shader Tutorials",
                "https://xorshaders.weebly.com/",
            ),
            labelled(
                "Assorted unity Articles:",
                "Amazon GM Resources",
                "http://m.amazonappservices.com/unityResources",
            ),
            link(
                "Make a Platformer in unity. By: Shaun Spalding",
                "http://shaunspalding.co.uk/makeaplatformer.html",
            ),
        ],
    },
    ResourceCategory {
        name: "GML Video Tutorials and Channels:",
        resources: &[
            link("Pixelated Pope", "https://www.youtube.com/user/PixelatedPope"),
            link("Shaun Spalding", "https://www.youtube.com/user/999Greyfox"),
            link("HeartBeast", "https://www.youtube.com/user/uheartbeast"),
            link(
                "Freindly Cosmonaut",
                "https://www.youtube.com/channel/UCKCKHxkH8zqV9ltWZw0JFig",
            ),
            link(
                "Very useful bite sized videos on specific topics",
                "https://www.youtube.com/channel/UCcYKLm0EwyWkfTA6sMn5W7g",
            ),
            link("Official YYG Youtube", "https://www.youtube.com/user/yoyogamesltd"),
        ],
    },
    ResourceCategory {
        name: "Advanced GML Topics:",
        resources: &[
            link(
                "Git based source control with GMS2",
                "https://www.youtube.com/watch?v=6zj86KN8Vco",
            ),
            link("Debug Mode Basics", "https://www.youtube.com/watch?v=iJH_uTq9iOQ"),
        ],
    },
    ResourceCategory {
        name: "Basic Art Skill Articles:",
        resources: &[
            link("Guide to Being A Respectful Critic", "http://tiny.cc/critique"),
            link(
                "Basic Guide to Pixelart",
                "http://pixeljoint.com/forum/forum_posts.asp?TID=11299",
            ),
        ],
    },
    ResourceCategory {
        name: "Art Video Resources and Channels:",
        resources: &[
            link("MortMort", "https://www.youtube.com/user/atMNRArt"),
            link(
                "Guide on Choosing the Right Canvas Size",
                "https://www.youtube.com/watch?v=AXb-VBZTKDA",
            ),
        ],
    },
    ResourceCategory {
        name: "Pixelart Refrence Sites and Tutorials:",
        resources: &[
            link("Miniboss", "http://blog.studiominiboss.com/pixelart"),
            link("The Spriters Recource", "https://www.spriters-resource.com/"),
            link("Find Palletes Here", "https://lospec.com/palette-list"),
            link(
                "Guide to Subpixel Animation",
                "https://2dwillneverdie.com/tutorial/give-your-sprites-depth-with-sub-pixel-animation/",
            ),
        ],
    },
    ResourceCategory {
        name: "Music Theory and Learning Sites/Channels:",
        resources: &[
            link("MusicTheory.net", "https://www.musictheory.net/lessons"),
            link(
                "12tone Building Blocks",
                "https://www.youtube.com/playlist?list=PLMvVESrbjBWplAcg3pG0TesncGT7qvO06",
            ),
        ],
    },
    ResourceCategory {
        name: "Other Useful Topics and Resources:",
        resources: &[
            link(
                "\"Your First Game Will (and Should) Suck\" By: PixelatedPope",
                "https://goo.gl/sgz7d2",
            ),
            link("Your Game Idea is Too Big", "http://yourgameideaistoobig.com"),
            link("Rubber Duck Debugging", "https://rubberduckdebugging.com/"),
        ],
    },
];

/// Render categories as a chat message
///
/// URLs are wrapped in angle brackets so Discord doesn't embed a preview for each one.
pub fn render<'a>(categories: impl IntoIterator<Item = &'a ResourceCategory>) -> String {
    let mut sections = Vec::new();

    for category in categories {
        let mut lines = vec![format!("**{}**", category.name)];
        for resource in category.resources {
            if let Some(label) = resource.label {
                lines.push(format!("__{}__", label));
            }
            lines.push(format!("{}: <{}>", resource.title, resource.url));
        }
        sections.push(lines.join("\n"));
    }

    sections.join("\n\n")
}

/// Lists the curated resource catalog
pub struct ResourcesCommand {
    catalog: &'static [ResourceCategory],
}

impl Default for ResourcesCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourcesCommand {
    /// Create a resources command over the built-in catalog
    pub fn new() -> Self {
        ResourcesCommand { catalog: CATALOG }
    }
}

#[async_trait]
impl Command for ResourcesCommand {
    async fn execute(&self, _msg: &IncomingMessage, args: Vec<&str>) -> Result<Option<String>> {
        if args.is_empty() {
            return Ok(Some(render(self.catalog)));
        }

        let query = args.join(" ").to_lowercase();
        let matching: Vec<&ResourceCategory> = self
            .catalog
            .iter()
            .filter(|category| category.name.to_lowercase().contains(&query))
            .collect();

        if matching.is_empty() {
            let names: Vec<&str> = self
                .catalog
                .iter()
                .map(|category| category.name.trim_end_matches(':'))
                .collect();

            return Ok(Some(format!(
                "No resource category matches \"{}\". Categories: {}",
                query,
                names.join(", ")
            )));
        }

        Ok(Some(render(matching)))
    }

    fn help(&self) -> &str {
        "Lists helpful game development resources. Usage: {prefix}resources [category]"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_message;

    #[test]
    fn test_catalog_is_well_formed() {
        assert!(!CATALOG.is_empty());
        for category in CATALOG {
            assert!(category.name.ends_with(':'), "{}", category.name);
            assert!(!category.resources.is_empty());
            for resource in category.resources {
                assert!(resource.url.starts_with("http"), "{}", resource.url);
            }
        }
    }

    #[tokio::test]
    async fn test_lists_every_category() {
        let command = ResourcesCommand::new();
        let msg = create_test_message("u1", "c1", "!resources");

        let result = command.execute(&msg, Vec::new()).await.unwrap().unwrap();

        for category in CATALOG {
            assert!(result.contains(category.name));
        }
        assert!(result.contains("Rubber Duck Debugging: <https://rubberduckdebugging.com/>"));
    }

    #[test]
    fn test_label_precedes_entry() {
        let rendered = render(&CATALOG[..1]);
        let lines: Vec<&str> = rendered.lines().collect();

        let label = lines
            .iter()
            .position(|line| *line == "__Detailed Shader Basics:__")
            .unwrap();
        assert!(lines[label + 1].starts_with("Xor Shader Tutorials: "));
        assert_eq!(lines[0], "**GML Written Articles:**");
    }

    #[tokio::test]
    async fn test_filters_by_category() {
        let command = ResourcesCommand::new();
        let msg = create_test_message("u1", "c1", "!resources pixelart");

        let result = command.execute(&msg, vec!["Pixelart"]).await.unwrap().unwrap();

        assert!(result.starts_with("**Pixelart Refrence Sites and Tutorials:**"));
        assert!(!result.contains("GML"));
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let command = ResourcesCommand::new();
        let msg = create_test_message("u1", "c1", "!resources cooking");

        let result = command.execute(&msg, vec!["cooking"]).await.unwrap().unwrap();

        assert!(result.starts_with("No resource category matches \"cooking\""));
        assert!(result.contains("Advanced GML Topics"));
    }
}
