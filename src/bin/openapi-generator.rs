use sharq_gharb_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), serde_json::Error> {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json()?);
    Ok(())
}
