use super::position::Position;
use super::walls::Walls;
use std::fmt;
use std::str::FromStr;

/// Board parsed from a text layout.
///
/// `%` marks a wall, `P` Pac-Man's start and `G` a ghost start. Every other
/// character is an open cell. The first text line is the top row of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    walls: Walls,
    pacman: Option<Position>,
    ghosts: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    Empty,
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Empty => write!(f, "layout contains no rows"),
            LayoutError::Ragged {
                line,
                expected,
                found,
            } => write!(
                f,
                "layout line {line} has {found} columns but {expected} were expected"
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

impl Layout {
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };

        let width = first.chars().count();
        let height = rows.len();
        let mut walls = Walls::new(width, height);
        let mut pacman = None;
        let mut ghosts = Vec::new();

        for (line, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    line: line + 1,
                    expected: width,
                    found,
                });
            }
            let y = (height - 1 - line) as i32;
            for (x, tile) in row.chars().enumerate() {
                let position = Position::new(x as i32, y);
                match tile {
                    '%' => {
                        walls.set_wall(position, true);
                    }
                    'P' => pacman = Some(position),
                    'G' => ghosts.push(position),
                    _ => {}
                }
            }
        }

        ghosts.sort();
        Ok(Self {
            walls,
            pacman,
            ghosts,
        })
    }

    pub fn walls(&self) -> &Walls {
        &self.walls
    }

    pub fn into_walls(self) -> Walls {
        self.walls
    }

    pub fn pacman_start(&self) -> Option<Position> {
        self.pacman
    }

    /// Ghost start cells ordered by position.
    pub fn ghost_starts(&self) -> &[Position] {
        &self.ghosts
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
