/// One RGB triple of the fixed 64-colour system palette.
pub type Colour = (u8, u8, u8);

/// The 2C02's colour ROM as RGB. Indexed by the 6-bit value read out of
/// palette RAM; columns 0xD..0xF of the last rows render black.
#[rustfmt::skip]
pub const DISPLAY_PALETTE: [Colour; 64] = [
    ( 98,  98,  98), (  0,  31, 178), ( 36,   4, 200), ( 82,   0, 178),
    (115,   0, 118), (128,   0,  36), (115,  11,   0), ( 82,  40,   0),
    ( 36,  68,   0), (  0,  87,   0), (  0,  92,   0), (  0,  83,  36),
    (  0,  60, 118), (  0,   0,   0), (  0,   0,   0), (  0,   0,   0),

    (171, 171, 171), ( 13,  87, 255), ( 75,  48, 255), (138,  19, 255),
    (188,   8, 214), (210,  18, 105), (199,  46,   0), (157,  84,   0),
    ( 96, 123,   0), ( 32, 152,   0), (  0, 163,   0), (  0, 153,  66),
    (  0, 125, 180), (  0,   0,   0), (  0,   0,   0), (  0,   0,   0),

    (255, 255, 255), ( 83, 174, 255), (144, 133, 255), (211, 101, 255),
    (255,  87, 255), (255,  93, 207), (255, 119,  87), (250, 158,   0),
    (189, 199,   0), (122, 231,   0), ( 67, 246,  17), ( 38, 239, 126),
    ( 44, 213, 246), ( 78,  78,  78), (  0,   0,   0), (  0,   0,   0),

    (255, 255, 255), (182, 255, 255), (206, 209, 255), (233, 195, 255),
    (255, 188, 255), (255, 189, 244), (255, 198, 195), (249, 210, 155),
    (233, 230, 129), (206, 244, 129), (182, 251, 154), (169, 250, 195),
    (169, 240, 244), (184, 184, 184), (  0,   0,   0), (  0,   0,   0),
];
