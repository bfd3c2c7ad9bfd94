/// Board utility functions for theme detection

use std::str::FromStr;

use chess::{BitBoard, Board, ChessMove, Color, File, Piece, Rank, Square, EMPTY};

// Piece values for material calculation
pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;
pub const KING_VALUE: i32 = 99;

/// Piece value (no king)
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

/// Piece value including king (for pin targets)
pub fn king_value(piece: Piece) -> i32 {
    match piece {
        Piece::King => KING_VALUE,
        other => piece_value(other),
    }
}

/// Is this a ray (sliding) piece type?
pub fn is_ray_piece(piece: Piece) -> bool {
    matches!(piece, Piece::Queen | Piece::Rook | Piece::Bishop)
}

pub fn board_from_fen(fen: &str) -> Option<Board> {
    Board::from_str(fen).ok()
}

/// Parse a UCI move string and check it is legal on `board`.
pub fn parse_uci_move(board: &Board, uci: &str) -> Option<ChessMove> {
    let bytes = uci.as_bytes();
    if bytes.len() < 4 {
        return None;
    }
    let square = |file: u8, rank: u8| -> Option<Square> {
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Some(Square::make_square(
            Rank::from_index((rank - b'1') as usize),
            File::from_index((file - b'a') as usize),
        ))
    };

    let from = square(bytes[0], bytes[1])?;
    let to = square(bytes[2], bytes[3])?;
    let promotion = match bytes.get(4) {
        Some(b'q') | Some(b'Q') => Some(Piece::Queen),
        Some(b'r') | Some(b'R') => Some(Piece::Rook),
        Some(b'b') | Some(b'B') => Some(Piece::Bishop),
        Some(b'n') | Some(b'N') => Some(Piece::Knight),
        Some(_) => return None,
        None => None,
    };

    let m = ChessMove::new(from, to, promotion);
    board.legal(m).then_some(m)
}

/// Squares attacked by the piece standing on `square`
pub fn attacks(board: &Board, square: Square) -> BitBoard {
    attacks_with_occupancy(board, square, *board.combined())
}

/// Like [`attacks`], but sliders see through everything not in `occupied`.
pub fn attacks_with_occupancy(board: &Board, square: Square, occupied: BitBoard) -> BitBoard {
    let piece = match board.piece_on(square) {
        Some(p) => p,
        None => return EMPTY,
    };

    match piece {
        Piece::Pawn => match board.color_on(square) {
            Some(color) => chess::get_pawn_attacks(square, color, !EMPTY),
            None => EMPTY,
        },
        Piece::Knight => chess::get_knight_moves(square),
        Piece::King => chess::get_king_moves(square),
        Piece::Bishop => chess::get_bishop_moves(square, occupied),
        Piece::Rook => chess::get_rook_moves(square, occupied),
        Piece::Queen => {
            chess::get_bishop_moves(square, occupied) | chess::get_rook_moves(square, occupied)
        }
    }
}

/// All pieces of `color` attacking `square`
pub fn attackers(board: &Board, color: Color, square: Square) -> BitBoard {
    let occupied = *board.combined();
    let color_pieces = *board.color_combined(color);

    let mut result = EMPTY;

    // Pawns: reverse lookup from the target square with the opposite color
    result |= chess::get_pawn_attacks(square, !color, !EMPTY)
        & *board.pieces(Piece::Pawn)
        & color_pieces;
    result |= chess::get_knight_moves(square) & *board.pieces(Piece::Knight) & color_pieces;
    result |= chess::get_king_moves(square) & *board.pieces(Piece::King) & color_pieces;

    let diagonal = *board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen);
    result |= chess::get_bishop_moves(square, occupied) & diagonal & color_pieces;

    let orthogonal = *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    result |= chess::get_rook_moves(square, occupied) & orthogonal & color_pieces;

    result
}

/// Is the piece of `color` on `square` defended by one of its own?
pub fn is_defended(board: &Board, color: Color, square: Square) -> bool {
    attackers(board, color, square) != EMPTY
}

/// Attacked by the opponent and not defended.
pub fn is_hanging(board: &Board, color: Color, square: Square) -> bool {
    attackers(board, !color, square) != EMPTY && !is_defended(board, color, square)
}

/// Count material for one side
pub fn material_count(board: &Board, color: Color) -> i32 {
    let color_bb = *board.color_combined(color);
    let count = |piece: Piece| (*board.pieces(piece) & color_bb).popcnt() as i32;

    count(Piece::Pawn) * PAWN_VALUE
        + count(Piece::Knight) * KNIGHT_VALUE
        + count(Piece::Bishop) * BISHOP_VALUE
        + count(Piece::Rook) * ROOK_VALUE
        + count(Piece::Queen) * QUEEN_VALUE
}

/// Material on the whole board, kings excluded
pub fn total_material(board: &Board) -> i32 {
    material_count(board, Color::White) + material_count(board, Color::Black)
}

/// Rank index (0..=7) counted from `color`'s own back rank.
pub fn relative_rank(square: Square, color: Color) -> usize {
    let rank = square.get_rank().to_index();
    match color {
        Color::White => rank,
        Color::Black => 7 - rank,
    }
}

/// Is a move castling?
pub fn is_castling_move(board: &Board, m: ChessMove) -> bool {
    if board.piece_on(m.get_source()) == Some(Piece::King) {
        let from_file = m.get_source().get_file().to_index() as i32;
        let to_file = m.get_dest().get_file().to_index() as i32;
        return (from_file - to_file).abs() > 1;
    }
    false
}

/// Pawn moving diagonally onto an empty square
pub fn is_en_passant_move(board: &Board, m: ChessMove) -> bool {
    board.piece_on(m.get_source()) == Some(Piece::Pawn)
        && m.get_source().get_file() != m.get_dest().get_file()
        && board.piece_on(m.get_dest()).is_none()
}

pub fn is_capture(board: &Board, m: ChessMove) -> bool {
    board.piece_on(m.get_dest()).is_some() || is_en_passant_move(board, m)
}
