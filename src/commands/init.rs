use std::path::Path;

use crate::{
    InitArgs,
    config::{CONFIG_FILE_NAME, Config},
};

const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{% block title %}{{ page.title }} | {{ site.name }}{% endblock %}</title>
</head>
<body>
  <header><a href="/">{{ site.name }}</a></header>
  <main>{% block main %}{% endblock %}</main>
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}{{ site.name }}{% endblock %}
{% block main %}
<h1>{{ site.name }}</h1>
{{ content | safe }}
{% endblock %}
"#;

const PAGE_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block main %}
<article>
  <h1>{{ page.title }}</h1>
  {{ content | safe }}
</article>
{% endblock %}
"#;

const POST_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block main %}
<article>
  <h1>{{ page.title }}</h1>
  {% if page.date %}<time datetime="{{ page.date }}">{{ page.date }}</time>{% endif %}
  {% if toc | length > 1 %}
  <nav><ul>{% for entry in toc %}<li><a href="#{{ entry.id }}">{{ entry.text }}</a></li>{% endfor %}</ul></nav>
  {% endif %}
  {{ content | safe }}
</article>
{% endblock %}
"##;

const INDEX_CONTENT: &str = "---\ntitle: Home\n---\n\nWelcome to your new site.\n";

const POST_CONTENT: &str = "---\ntitle: Hello, world\ndate: 2024-01-01\n---\n\n## First steps\n\nEdit `content/blog/hello.md` and run `mub build`.\n";

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(CONFIG_FILE_NAME);
    if config_file.exists() {
        anyhow::bail!("{} already exists", config_file.display());
    }

    println!("Initializing project in {}", path.display());

    let config = Config::scaffold("My mub Site");
    let pages = config.templates.dir.join(&config.templates.pages);
    let files = [
        (config.templates.dir.join("base.html"), BASE_TEMPLATE),
        (pages.join("_index.html"), INDEX_TEMPLATE),
        (pages.join("page.html"), PAGE_TEMPLATE),
        (pages.join("post.html"), POST_TEMPLATE),
        (config.content.dir.join("index.md"), INDEX_CONTENT),
        (config.content.dir.join("blog/hello.md"), POST_CONTENT),
    ];
    for (relative, contents) in &files {
        write_new(&path, relative, contents).await?;
    }

    let config_text = serde_yaml::to_string(&config)?;
    tokio::fs::write(&config_file, config_text).await?;

    println!(
        "Created config file {config_file}",
        config_file = config_file.display()
    );

    Ok(())
}

/// Write a scaffold file, leaving existing files alone.
async fn write_new(root: &Path, relative: &Path, contents: &str) -> Result<(), anyhow::Error> {
    let target = root.join(relative);
    if target.exists() {
        tracing::warn!(path = %target.display(), "file exists, leaving it alone");
        return Ok(());
    }
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, contents).await?;
    tracing::debug!(path = %target.display(), "created");
    Ok(())
}
