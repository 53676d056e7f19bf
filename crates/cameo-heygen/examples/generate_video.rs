use cameo_heygen::{AvatarCatalog, GenerationRequest, HeygenClient, JobStatus, JobTracker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <avatar> <script>", args[0]);
        eprintln!("\nExample:");
        eprintln!("  {} gala \"Hello from Cameo!\"", args[0]);
        eprintln!("\nAvatars: gala, conrad, jocelyn");
        std::process::exit(1);
    }

    let catalog = AvatarCatalog::builtin();
    let avatar = catalog.get(&args[1]).unwrap_or_else(|| {
        eprintln!("Unknown avatar: {}", args[1]);
        std::process::exit(1);
    });

    let request = GenerationRequest {
        avatar_id: avatar.avatar_id.clone(),
        voice_id: avatar.voice_id.clone(),
        script: args[2].clone(),
    };

    println!("=== Cameo Video Generator ===");
    println!("Avatar: {} ({})", avatar.name, avatar.avatar_id);
    println!("Script: {}", request.script);
    println!();

    let client = HeygenClient::from_env()?;
    let tracker = JobTracker::from_config(client.config());

    println!("Submitting generation request...");
    let job = tracker.submit(&client, &request).await?;
    println!("Job submitted: {}", job.id);

    let result = tracker
        .track(&client, &job.id, |snapshot| {
            println!("  status: {:?}", snapshot.status);
        })
        .await;

    match result {
        Some(snapshot) if snapshot.status == JobStatus::Completed => {
            println!("\n=== Video Ready ===");
            println!("Video ID: {}", snapshot.id);
            println!("Video URL: {}", snapshot.video_url.unwrap_or_default());
        }
        Some(snapshot) => {
            eprintln!("Generation failed for {}", snapshot.id);
            std::process::exit(1);
        }
        None => {
            eprintln!("Timed out waiting for {}", job.id);
            std::process::exit(1);
        }
    }

    Ok(())
}
