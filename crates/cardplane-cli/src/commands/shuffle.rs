use super::{colorize_face, json_pretty, EXIT_SUCCESS};
use cardplane_store::materialize;

pub fn run(seed: i64, top: Option<usize>, json: bool) -> Result<u8, String> {
    let cards = materialize(seed);
    let shown = top.unwrap_or(cards.len()).min(cards.len());
    let faces: Vec<String> = cards.iter().take(shown).map(|c| c.face()).collect();

    if json {
        let payload = serde_json::json!({
            "seed": seed,
            "cards": faces,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("seed {seed}: {shown} of {} cards in dealing order", cards.len());
        for (row, chunk) in faces.chunks(13).enumerate() {
            let line: Vec<String> = chunk
                .iter()
                .map(|f| format!("{:>4}", colorize_face(f)))
                .collect();
            println!("{:>3}  {}", row * 13 + 1, line.join(" "));
        }
    }
    Ok(EXIT_SUCCESS)
}
