//! Prompt builder for post-run analysis.
//!
//! The model is asked to answer with a single JSON object shaped like
//! [`Feedback`](super::Feedback); the reply parser tolerates surrounding prose
//! and code fences.

use crate::track::{format_minutes, RunSummary};

const INSTRUCTION: &str = "\
Analyze this running session and provide personalized feedback:";

const REQUEST: &str = "
Please provide:
1. A brief summary of the performance
2. Performance analysis (pace consistency, speed variations)
3. 3 specific suggestions for improvement
4. Motivational message

Format as JSON:
{
  \"summary\": \"Brief performance summary\",
  \"performance\": \"Detailed performance analysis\",
  \"suggestions\": [\"suggestion1\", \"suggestion2\", \"suggestion3\"],
  \"motivation\": \"Encouraging message\"
}
";

/// Build the analysis prompt for `run`.
///
/// ```rust
/// use chrono::Utc;
/// use stride_tracker::coach::build_analysis_prompt;
/// use stride_tracker::track::RunSummary;
///
/// let run = RunSummary::new(1_800, 5.0, 13.1, Vec::new(), Utc::now());
/// let prompt = build_analysis_prompt(&run);
/// assert!(prompt.contains("Distance: 5.00 km"));
/// ```
pub fn build_analysis_prompt(run: &RunSummary) -> String {
    let mut prompt = String::with_capacity(1024);
    prompt.push_str(INSTRUCTION);
    prompt.push_str("\n\nRun Statistics:\n");
    prompt.push_str(&format!(
        "- Duration: {}\n",
        format_minutes(run.duration_secs)
    ));
    prompt.push_str(&format!("- Distance: {:.2} km\n", run.distance_km));
    prompt.push_str(&format!(
        "- Average Speed: {:.1} km/h\n",
        run.average_speed_kmh
    ));
    prompt.push_str(&format!("- Max Speed: {:.1} km/h\n", run.max_speed_kmh));
    prompt.push_str(&format!("- Average Pace: {} per km\n", run.pace_label()));
    prompt.push_str(&format!("- Estimated Calories: {}\n", run.calories));
    prompt.push_str(&format!("- Route Points: {}\n", run.route.len()));
    prompt.push_str(REQUEST);
    prompt
}
