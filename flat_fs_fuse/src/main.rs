use clap::{App, Arg};
use flat_fs::{Volume, BLOCK_SIZE, MAX_NAME_LEN};
use std::fs::{read_dir, File, OpenOptions};
use std::io::{Read, Write};

// 8 MiB image: boot block + inode table + data region
const NUM_INODES: u32 = 63;
const NUM_DATA_BLOCKS: u32 = 1984;

fn main() {
    flat_fs_pack().expect("Error when packing flat_fs image!");
}

fn flat_fs_pack() -> std::io::Result<()> {
    println!("FlatFS packer started...");
    let matches = App::new("FlatFS packer")
        .arg(
            Arg::with_name("source")
            .short("s")
            .long("source")
            .takes_value(true)
            .help("File source dir(with backslash)"),
        )
        .arg(
            Arg::with_name("target")
            .short("t")
            .long("target")
            .takes_value(true)
            .help("Image target dir(with backslash)"),
        )
        .get_matches();
    let src_path = matches.value_of("source").unwrap();
    let target_path = matches.value_of("target").unwrap();
    println!("src_path = {}\ntarget_path = {}", src_path, target_path);

    let total_blocks = (1 + NUM_INODES + NUM_DATA_BLOCKS) as usize;
    // u64 backing keeps the image aligned for the layout records
    let mut words = vec![0u64; total_blocks * BLOCK_SIZE / 8];
    let image = unsafe {
        std::slice::from_raw_parts_mut(words.as_mut_ptr() as *mut u8, words.len() * 8)
    };
    let mut volume =
        Volume::format(image, NUM_INODES, NUM_DATA_BLOCKS).expect("Error when formatting image!");
    println!(
        "Successfully formatted volume with size: {} bytes",
        total_blocks * BLOCK_SIZE
    );

    for dir_entry in read_dir(src_path)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }
        let name = dir_entry.file_name().into_string().unwrap();
        if name.len() > MAX_NAME_LEN {
            println!("Skipping {}: name longer than {} bytes", name, MAX_NAME_LEN);
            continue;
        }
        let mut data: Vec<u8> = Vec::new();
        File::open(dir_entry.path())?.read_to_end(&mut data)?;
        let inode = volume
            .create(name.as_bytes())
            .expect("Error when creating file!");
        volume
            .write_file(inode, &data)
            .expect("Error when writing file!");
        println!(
            "Processing file: {}, size: {} bytes, inode: {}",
            name,
            data.len(),
            inode
        );
    }
    drop(volume);

    let mut image_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(format!("{}{}", target_path, "fs.img"))?;
    let bytes =
        unsafe { std::slice::from_raw_parts(words.as_ptr() as *const u8, words.len() * 8) };
    image_file.write_all(bytes)?;
    println!("Successfully wrote {}fs.img", target_path);
    Ok(())
}
