//! Line commands for `facematch session`.

use facematch_core::BoundingBox;
use std::path::PathBuf;

pub const HELP: &str = "\
commands:
  add <name...> <image> [x,y,w,h]   register the face in <image> as <name>
  match <image> [x,y,w,h]           identify the face in <image>
  list                              show registered faces
  last                              show the last published result
  help                              this text
  quit                              leave the session

x,y,w,h picks the face region; without it the whole image is used";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Add {
        name: String,
        image: PathBuf,
        bbox: Option<BoundingBox>,
    },
    Match {
        image: PathBuf,
        bbox: Option<BoundingBox>,
    },
    List,
    Last,
    Help,
    Quit,
}

/// Parse a face region given as `x,y,width,height`.
pub fn parse_bbox(raw: &str) -> Result<BoundingBox, String> {
    let parts: Vec<f32> = raw
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid bbox `{raw}`: {e}"))?;
    match parts.as_slice() {
        &[x, y, width, height] if width > 0.0 && height > 0.0 => Ok(BoundingBox {
            x,
            y,
            width,
            height,
            confidence: 1.0,
        }),
        _ => Err(format!("bbox must be x,y,width,height with positive size, got `{raw}`")),
    }
}

/// Pop a trailing region token. Any comma-bearing last token is read as a
/// region, so image paths given here must not contain commas.
fn take_bbox(tokens: &mut Vec<&str>) -> Result<Option<BoundingBox>, String> {
    match tokens.last().copied() {
        Some(last) if last.contains(',') => {
            let bbox = parse_bbox(last)?;
            tokens.pop();
            Ok(Some(bbox))
        }
        _ => Ok(None),
    }
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// For `add`, the last token is the image path and everything before it
/// is the name, so names may contain spaces. Both `add` and `match` take
/// an optional trailing `x,y,w,h` face region.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    let verb = tokens.remove(0).to_ascii_lowercase();

    let command = match verb.as_str() {
        "add" => {
            let bbox = take_bbox(&mut tokens)?;
            let Some(image) = tokens.pop() else {
                return Err("usage: add <name...> <image> [x,y,w,h]".into());
            };
            if tokens.is_empty() {
                return Err("usage: add <name...> <image> [x,y,w,h]".into());
            }
            ReplCommand::Add {
                name: tokens.join(" "),
                image: PathBuf::from(image),
                bbox,
            }
        }
        "match" => {
            let bbox = take_bbox(&mut tokens)?;
            match tokens.as_slice() {
                [image] => ReplCommand::Match {
                    image: PathBuf::from(*image),
                    bbox,
                },
                _ => return Err("usage: match <image> [x,y,w,h]".into()),
            }
        }
        "list" => ReplCommand::List,
        "last" => ReplCommand::Last,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(format!("unknown command `{other}`; try `help`")),
    };

    Ok(Some(command))
}
