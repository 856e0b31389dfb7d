use super::direction::Direction;
use super::position::Position;

/// Wall occupancy grid. Cells outside the grid behave as walls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walls {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Walls {
    /// Creates an open grid with no walls.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub fn from_fn<F>(width: usize, height: usize, mut is_wall: F) -> Self
    where
        F: FnMut(Position) -> bool,
    {
        let mut walls = Self::new(width, height);
        for position in walls.positions().collect::<Vec<_>>() {
            if is_wall(position) {
                walls.set_wall(position, true);
            }
        }
        walls
    }

    /// Open grid whose outer ring is wall, the usual board border.
    pub fn bordered(width: usize, height: usize) -> Self {
        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;
        Self::from_fn(width, height, |pos| {
            pos.x == 0 || pos.y == 0 || pos.x == max_x || pos.y == max_y
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as usize) < self.width
            && (position.y as usize) < self.height
    }

    pub fn is_wall(&self, position: Position) -> bool {
        match self.index(position) {
            Some(index) => self.cells[index],
            None => true,
        }
    }

    /// Marks or clears a wall. Returns `false` when `position` lies outside the grid.
    pub fn set_wall(&mut self, position: Position, wall: bool) -> bool {
        match self.index(position) {
            Some(index) => {
                self.cells[index] = wall;
                true
            }
            None => false,
        }
    }

    /// Every coordinate of the grid, column by column.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width as i32)
            .flat_map(move |x| (0..self.height as i32).map(move |y| Position::new(x, y)))
    }

    /// Non-wall coordinates, column by column.
    pub fn open_positions(&self) -> Vec<Position> {
        self.positions().filter(|pos| !self.is_wall(*pos)).collect()
    }

    /// Open cells reachable in one step from `position`, staying put included.
    pub fn legal_neighbors(&self, position: Position) -> Vec<Position> {
        Direction::ALL
            .iter()
            .map(|direction| direction.successor(position))
            .filter(|next| !self.is_wall(*next))
            .collect()
    }

    /// Moving actions from `position` that do not run into a wall.
    pub fn legal_moves(&self, position: Position) -> Vec<Direction> {
        Direction::MOVES
            .iter()
            .copied()
            .filter(|direction| !self.is_wall(direction.successor(position)))
            .collect()
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        Some(position.x as usize * self.height + position.y as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bordered_grid_has_open_interior() {
        let walls = Walls::bordered(5, 4);
        assert!(walls.is_wall(Position::new(0, 2)));
        assert!(walls.is_wall(Position::new(4, 3)));
        assert!(!walls.is_wall(Position::new(2, 2)));
        assert_eq!(walls.open_positions().len(), 3 * 2);
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let walls = Walls::new(2, 2);
        assert!(walls.is_wall(Position::new(-1, 0)));
        assert!(walls.is_wall(Position::new(0, 2)));
        assert!(!walls.is_wall(Position::new(1, 1)));
    }

    #[test]
    fn open_positions_are_column_major() {
        let walls = Walls::new(2, 2);
        assert_eq!(
            walls.open_positions(),
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 0),
                Position::new(1, 1)
            ]
        );
    }

    #[test]
    fn legal_neighbors_include_current_cell() {
        let walls = Walls::bordered(5, 5);
        let corner = Position::new(1, 1);
        let neighbors = walls.legal_neighbors(corner);
        assert_eq!(
            neighbors,
            vec![Position::new(1, 2), Position::new(2, 1), corner]
        );
        assert_eq!(
            walls.legal_moves(corner),
            vec![Direction::North, Direction::East]
        );
    }
}
