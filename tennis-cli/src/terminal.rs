use std::io::{BufRead, Write};

use tennis_core::player::{ReturnOutcome, ReturnShotResponder};
use tennis_core::types::{ShotLimits, ShotParameters};
use tennis_core::ShotSteps;

/// Asks for a return shot on a line-based terminal.
///
/// An empty line accepts the offered shot, `c` cancels, `+f`/`-f`, `+a`/`-a`
/// and `+s`/`-s` nudge the offer by one configured step, and anything else
/// must be `force angle spin` inside the limits or the question is asked again.
/// End of input cancels. Nudges carry over to the next contact.
pub struct TerminalResponder<R, W> {
    input: R,
    output: W,
    steps: ShotSteps,
    offer: Option<ShotParameters>,
}

impl<R: BufRead, W: Write> TerminalResponder<R, W> {
    pub fn new(input: R, output: W, steps: ShotSteps) -> Self {
        Self {
            input,
            output,
            steps,
            offer: None,
        }
    }

    fn prompt(&mut self, offer: &ShotParameters, limits: &ShotLimits) -> std::io::Result<Option<String>> {
        write!(
            self.output,
            "Return shot: force [{}-{}] angle [{}-{}] spin [{}-{}] (enter = {} {} {}, +f/-a/+s nudge, c = cancel): ",
            limits.min_force,
            limits.max_force,
            limits.min_angle,
            limits.max_angle,
            limits.min_spin,
            limits.max_spin,
            offer.force,
            offer.angle,
            offer.spin
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Apply a `+f`, `-a`, `+s` style command, or `None` if `line` is not one.
fn nudge(line: &str, offer: &ShotParameters, steps: &ShotSteps) -> Option<ShotParameters> {
    let mut chars = line.chars();
    let sign = match chars.next()? {
        '+' => 1.0,
        '-' => -1.0,
        _ => return None,
    };
    let field = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() {
        return None;
    }

    let mut shot = *offer;
    match field {
        'f' => shot.force += sign * steps.force,
        'a' => shot.angle += sign * steps.angle,
        's' => shot.spin += sign * steps.spin,
        _ => return None,
    }
    Some(shot)
}

/// Parse `force angle spin`.
fn parse_shot(line: &str) -> Option<ShotParameters> {
    let values = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match values[..] {
        [force, angle, spin] => Some(ShotParameters::new(force, angle, spin)),
        _ => None,
    }
}

impl<R: BufRead, W: Write> ReturnShotResponder for TerminalResponder<R, W> {
    fn request_return_shot(
        &mut self,
        defaults: &ShotParameters,
        limits: &ShotLimits,
    ) -> ReturnOutcome {
        let mut offer = limits.clamp(&self.offer.unwrap_or(*defaults));
        loop {
            let line = match self.prompt(&offer, limits) {
                Ok(Some(line)) => line,
                Ok(None) => return ReturnOutcome::Cancelled,
                Err(e) => {
                    log::error!("Could not read the return shot : {e}.");
                    return ReturnOutcome::Cancelled;
                }
            };

            if line.is_empty() {
                return ReturnOutcome::Accepted(offer);
            }
            if line.eq_ignore_ascii_case("c") {
                return ReturnOutcome::Cancelled;
            }
            if let Some(nudged) = nudge(&line, &offer, &self.steps) {
                offer = limits.clamp(&nudged);
                self.offer = Some(offer);
                continue;
            }

            let Some(params) = parse_shot(&line) else {
                log::warn!("Expected three numbers or a nudge, got '{line}'.");
                continue;
            };
            match params.validate(limits) {
                Ok(()) => return ReturnOutcome::Accepted(params),
                Err(e) => log::warn!("Return shot rejected : {e}."),
            }
        }
    }
}
