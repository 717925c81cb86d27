use crate::app::App;
use crate::output::print_checklist;
use anyhow::Context;
use stepwise_core::ImageInput;
use std::path::Path;

pub fn run(root: &Path, description: &str, image: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let image = image.map(load_image).transpose()?;
    let app = App::load(root)?;
    let session = app
        .block_on(app.assistant().generate_plan(description, image))
        .map_err(|e| app.explain(e, "could not create a plan"))?;
    app.finish()?;
    print_checklist(session.checklist(), json)
}

fn load_image(path: &Path) -> anyhow::Result<ImageInput> {
    let bytes =
        std::fs::read(path).with_context(|| format!("cannot read image {}", path.display()))?;
    Ok(ImageInput::new(bytes, mime_for(path)))
}

/// Guess an image MIME type from the file extension; camera output is
/// usually JPEG, so that is the fallback.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}
