//! Shell script executed inside the batch VM.
//!
//! The script is a fixed template with named substitution points
//! (`{{render_job_id}}`, `{{scene_path}}`, `{{webhook_url}}`, mount paths).
//! Rendering it is a pure function so its content can be checked without a
//! network call.

use render_models::{RenderJobId, WebhookUrl};

/// Where the scene bucket is mounted.
pub const INPUT_MOUNT_PATH: &str = "/mnt/stateful_partition/in";

/// Where the output bucket is mounted.
pub const OUTPUT_MOUNT_PATH: &str = "/mnt/stateful_partition/out";

const RENDER_TEMPLATE: &str = r#"set -euo pipefail

# 1) copy the uploaded scene to ./scene.blend
echo "Copying scene from {{scene_path}}"
cp "{{input_mount}}/{{scene_path}}" scene.blend

# 2) render a single frame (CPU)
echo "Rendering frame 1"
blender -b scene.blend -E CYCLES -o "$PWD/frame_####" -F PNG -f 1

# 3) copy outputs to the output bucket
OUT_DIR="{{output_mount}}/{{render_prefix}}"
mkdir -p "$OUT_DIR"
cp *.png "$OUT_DIR/"
"#;

const WEBHOOK_TEMPLATE: &str = r#"
# 4) signal completion
apt-get -qq update && apt-get -y install --no-install-recommends curl >/dev/null
curl -fsS -X POST -d '{"workflow_id": "{{render_job_id}}"}' -H "Content-Type: application/json" "{{webhook_url}}"
"#;

/// Execution script for one render job.
#[derive(Debug, Clone)]
pub struct RenderScript<'a> {
    render_job_id: &'a RenderJobId,
    webhook_url: Option<&'a WebhookUrl>,
}

impl<'a> RenderScript<'a> {
    pub fn new(render_job_id: &'a RenderJobId, webhook_url: Option<&'a WebhookUrl>) -> Self {
        Self {
            render_job_id,
            webhook_url,
        }
    }

    /// Render the script text.
    pub fn render(&self) -> String {
        let scene_path = self.render_job_id.scene_object_path();
        let render_prefix = self.render_job_id.storage_prefix();
        let mut vars = vec![
            ("render_job_id", self.render_job_id.as_str()),
            ("scene_path", scene_path.as_str()),
            ("render_prefix", render_prefix.as_str()),
            ("input_mount", INPUT_MOUNT_PATH),
            ("output_mount", OUTPUT_MOUNT_PATH),
        ];

        let mut script = fill(RENDER_TEMPLATE, &vars);

        if let Some(url) = self.webhook_url {
            vars.push(("webhook_url", url.as_str()));
            script.push_str(&fill(WEBHOOK_TEMPLATE, &vars));
        }

        script
    }
}

/// Replace every `{{name}}` in `template` with its value.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{{{}}}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RenderJobId {
        RenderJobId::parse(s).unwrap()
    }

    #[test]
    fn test_script_copies_scene_by_convention() {
        let render_id = id("abc123");
        let script = RenderScript::new(&render_id, None).render();

        assert!(script.starts_with("set -euo pipefail\n"));
        assert!(script.contains(
            r#"cp "/mnt/stateful_partition/in/renders/abc123/abc123.blend" scene.blend"#
        ));
        assert!(script.contains("-f 1"));
        assert!(script.contains(r#"OUT_DIR="/mnt/stateful_partition/out/renders/abc123""#));
    }

    #[test]
    fn test_script_without_webhook_has_no_callback() {
        let render_id = id("abc123");
        let script = RenderScript::new(&render_id, None).render();

        assert!(!script.contains("curl"));
        assert!(!script.contains("workflow_id"));
        assert!(!script.contains("{{"), "unfilled placeholder in:\n{script}");
    }

    #[test]
    fn test_script_with_webhook_posts_render_id() {
        let render_id = id("abc123");
        let url = WebhookUrl::parse("https://pm.example.com/actions/signal/done").unwrap();
        let script = RenderScript::new(&render_id, Some(&url)).render();

        assert!(script.contains(r#"-d '{"workflow_id": "abc123"}'"#));
        assert!(script.contains(r#""https://pm.example.com/actions/signal/done""#));
        assert!(script.contains("Content-Type: application/json"));
        assert!(!script.contains("{{"), "unfilled placeholder in:\n{script}");
    }

    #[test]
    fn test_callback_runs_after_copy() {
        let render_id = id("abc123");
        let url = WebhookUrl::parse("http://localhost:8080/hook").unwrap();
        let script = RenderScript::new(&render_id, Some(&url)).render();

        let copy_at = script.find("cp *.png").unwrap();
        let curl_at = script.find("curl -fsS").unwrap();
        assert!(copy_at < curl_at);
    }

    #[test]
    fn test_fill_replaces_all_occurrences() {
        let text = fill("{{a}}-{{b}}-{{a}}", &[("a", "x"), ("b", "y")]);
        assert_eq!(text, "x-y-x");
    }
}
